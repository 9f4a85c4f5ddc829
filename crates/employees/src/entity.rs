//! Employee entity definitions

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use staffdesk_store::Record;

/// An employee record as stored on disk.
///
/// Field names are serialized in PascalCase to match the established wire
/// format of the employee store file. `id` is assigned by the store on add
/// and must never be set by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Employee {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub state: String,
    pub city: String,
    pub project_account_name: String,
    pub designation: String,
    #[serde(rename = "CTC")]
    pub ctc: Decimal,
    #[serde(default = "Employee::default_profile_image")]
    pub profile_image_path: String,
}

impl Employee {
    pub(crate) fn default_profile_image() -> String {
        "images/default-profile.png".to_string()
    }
}

impl Record for Employee {
    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }
}
