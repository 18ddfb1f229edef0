//! GraphQL documents.

macro_rules! packet_fields {
    () => {
        "eid name status isTest createdAt updatedAt completedAt detailURL \
         documentGroup { eid status } \
         signers { eid aliasId routingOrder name email status signActionType completedAt }"
    };
}

macro_rules! signer_fields {
    () => {
        "eid aliasId routingOrder name email status signActionType completedAt"
    };
}

macro_rules! workflow_fields {
    () => {
        "eid name slug createdAt updatedAt forges { eid name slug }"
    };
}

macro_rules! workflow_submission_fields {
    () => {
        "eid status displayTitle createdAt updatedAt weld { eid }"
    };
}

macro_rules! webform_fields {
    () => {
        "eid name slug createdAt updatedAt weld { eid }"
    };
}

macro_rules! webform_submission_fields {
    () => {
        "eid status payload createdAt updatedAt forge { eid } weldData { eid status }"
    };
}

pub(crate) const FIND_PACKET: &str = concat!(
    "query EtchPacket($eid: String!) { etchPacket(eid: $eid) { ",
    packet_fields!(),
    " } }"
);

pub(crate) const LIST_PACKETS: &str = concat!(
    "query EtchPackets($limit: Int, $offset: Int) { currentUser { etchPackets(limit: $limit, offset: $offset) { items { ",
    packet_fields!(),
    " } } } }"
);

pub(crate) const CREATE_PACKET: &str = concat!(
    "mutation CreateEtchPacket($name: String, $isDraft: Boolean, $isTest: Boolean, ",
    "$signatureEmailSubject: String, $signatureEmailBody: String, $webhookURL: String, ",
    "$signers: [JSON], $files: [EtchFile]) { createEtchPacket(name: $name, isDraft: $isDraft, ",
    "isTest: $isTest, signatureEmailSubject: $signatureEmailSubject, ",
    "signatureEmailBody: $signatureEmailBody, webhookURL: $webhookURL, signers: $signers, ",
    "files: $files) { ",
    packet_fields!(),
    " } }"
);

pub(crate) const UPDATE_PACKET: &str = concat!(
    "mutation UpdateEtchPacket($eid: String!, $name: String, $signatureEmailSubject: String, ",
    "$signatureEmailBody: String, $webhookURL: String) { updateEtchPacket(eid: $eid, name: $name, ",
    "signatureEmailSubject: $signatureEmailSubject, signatureEmailBody: $signatureEmailBody, ",
    "webhookURL: $webhookURL) { ",
    packet_fields!(),
    " } }"
);

pub(crate) const SEND_PACKET: &str = concat!(
    "mutation SendEtchPacket($eid: String!) { sendEtchPacket(eid: $eid) { ",
    packet_fields!(),
    " } }"
);

pub(crate) const DELETE_PACKET: &str =
    "mutation RemoveEtchPacket($eid: String!) { removeEtchPacket(eid: $eid) }";

pub(crate) const VOID_PACKET: &str = concat!(
    "mutation VoidEtchPacket($eid: String!, $reason: String) { voidEtchPacket(eid: $eid, reason: $reason) { ",
    packet_fields!(),
    " } }"
);

pub(crate) const SIGN_URL: &str = "mutation GenerateEtchSignURL($signerEid: String!, $clientUserId: String!) { \
     generateEtchSignURL(signerEid: $signerEid, clientUserId: $clientUserId) }";

pub(crate) const SKIP_SIGNER: &str = concat!(
    "mutation SkipSigner($eid: String!) { skipSigner(eid: $eid) { ",
    signer_fields!(),
    " } }"
);

pub(crate) const NOTIFY_SIGNER: &str = concat!(
    "mutation NotifySigner($eid: String!) { notifySigner(eid: $eid) { ",
    signer_fields!(),
    " } }"
);

pub(crate) const EXPIRE_SIGNER_TOKENS: &str = concat!(
    "mutation ExpireSignerTokens($eid: String!) { expireSignerTokens(eid: $eid) { ",
    signer_fields!(),
    " } }"
);

pub(crate) const FIND_WORKFLOW: &str = concat!(
    "query Weld($eid: String!) { weld(eid: $eid) { ",
    workflow_fields!(),
    " } }"
);

pub(crate) const LIST_WORKFLOWS: &str = concat!(
    "query Welds { currentUser { welds { ",
    workflow_fields!(),
    " } } }"
);

pub(crate) const WORKFLOW_SUBMISSIONS: &str = concat!(
    "query WeldDatas($eid: String!) { weld(eid: $eid) { weldDatas { items { ",
    workflow_submission_fields!(),
    " } } } }"
);

pub(crate) const FIND_WORKFLOW_SUBMISSION: &str = concat!(
    "query WeldData($eid: String!) { weldData(eid: $eid) { ",
    workflow_submission_fields!(),
    " } }"
);

pub(crate) const START_WORKFLOW: &str = concat!(
    "mutation StartWeld($forgeEid: String!, $payload: JSON) { forgeSubmit(forgeEid: $forgeEid, payload: $payload) { ",
    "eid weldData { ",
    workflow_submission_fields!(),
    " } } }"
);

pub(crate) const CONTINUE_WORKFLOW: &str = concat!(
    "mutation ContinueWeld($forgeEid: String!, $weldDataEid: String!, $payload: JSON) { ",
    "forgeSubmit(forgeEid: $forgeEid, weldDataEid: $weldDataEid, payload: $payload) { ",
    "eid weldData { ",
    workflow_submission_fields!(),
    " } } }"
);

pub(crate) const FIND_WEBFORM: &str = concat!(
    "query Forge($eid: String!) { forge(eid: $eid) { ",
    webform_fields!(),
    " } }"
);

pub(crate) const SUBMIT_WEBFORM: &str = concat!(
    "mutation ForgeSubmit($forgeEid: String!, $payload: JSON) { forgeSubmit(forgeEid: $forgeEid, payload: $payload) { ",
    webform_submission_fields!(),
    " } }"
);

pub(crate) const WEBFORM_SUBMISSIONS: &str = concat!(
    "query ForgeSubmissions($eid: String!) { forge(eid: $eid) { submissions { items { ",
    webform_submission_fields!(),
    " } } } }"
);

pub(crate) const FIND_WEBFORM_SUBMISSION: &str = concat!(
    "query Submission($eid: String!) { submission(eid: $eid) { ",
    webform_submission_fields!(),
    " } }"
);

#[cfg(test)]
mod tests {
    use super::*;

    fn balanced(document: &str) -> bool {
        let mut depth = 0i32;
        for c in document.chars() {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                return false;
            }
        }
        depth == 0
    }

    #[test]
    fn test_documents_are_balanced() {
        for document in [
            FIND_PACKET,
            LIST_PACKETS,
            CREATE_PACKET,
            UPDATE_PACKET,
            SEND_PACKET,
            DELETE_PACKET,
            VOID_PACKET,
            SIGN_URL,
            SKIP_SIGNER,
            NOTIFY_SIGNER,
            EXPIRE_SIGNER_TOKENS,
            FIND_WORKFLOW,
            LIST_WORKFLOWS,
            WORKFLOW_SUBMISSIONS,
            FIND_WORKFLOW_SUBMISSION,
            START_WORKFLOW,
            CONTINUE_WORKFLOW,
            FIND_WEBFORM,
            SUBMIT_WEBFORM,
            WEBFORM_SUBMISSIONS,
            FIND_WEBFORM_SUBMISSION,
        ] {
            assert!(balanced(document), "unbalanced document: {}", document);
        }
    }
}
