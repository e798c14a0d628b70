use academy_domain::UserAccount;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Bootstrap-token login payload.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/session-request.ts"
)]
pub struct SessionRequest {
    pub token: String,
    pub email: String,
}

/// API representation of the signed-in account.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/caller-response.ts"
)]
pub struct CallerResponse {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub role: String,
}

impl From<UserAccount> for CallerResponse {
    fn from(account: UserAccount) -> Self {
        Self {
            id: account.id().to_string(),
            display_name: account.display_name().as_str().to_owned(),
            email: account.email().as_str().to_owned(),
            role: account.role().as_str().to_owned(),
        }
    }
}
