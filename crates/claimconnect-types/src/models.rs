use serde::{Deserialize, Serialize};

/// Lifecycle of a verification request.
///
/// A request is created `Pending` and moves to exactly one of `Accepted` or
/// `Rejected`. The transition is terminal: there is no path back to
/// `Pending` and no re-decision of a decided request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Accepted => "accepted",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which table a recent-items entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Lost,
    Found,
}
