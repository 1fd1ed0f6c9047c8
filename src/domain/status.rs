use std::error::Error;
use std::fmt;
use std::str::FromStr;

/// Lifecycle shared by follow requests and schedule invitations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InviteStatus {
    Pending,
    Accepted,
    Rejected,
}

impl InviteStatus {
    pub const ALL: [InviteStatus; 3] = [
        InviteStatus::Pending,
        InviteStatus::Accepted,
        InviteStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InviteStatus::Pending => "Pending",
            InviteStatus::Accepted => "Accepted",
            InviteStatus::Rejected => "Rejected",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, InviteStatus::Accepted | InviteStatus::Rejected)
    }

    pub fn can_transition_to(self, next: InviteStatus) -> bool {
        !self.is_terminal() && next.is_terminal()
    }

    pub fn validate_transition(self, next: InviteStatus) -> Result<(), InvalidStatusTransition> {
        if self.can_transition_to(next) {
            return Ok(());
        }

        Err(InvalidStatusTransition {
            from: self,
            to: next,
        })
    }
}

impl fmt::Display for InviteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InviteStatus {
    type Err = ParseInviteStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let status = match value.trim().to_ascii_lowercase().as_str() {
            "pending" => InviteStatus::Pending,
            "accepted" => InviteStatus::Accepted,
            "rejected" => InviteStatus::Rejected,
            _ => {
                return Err(ParseInviteStatusError {
                    value: value.to_string(),
                });
            }
        };

        Ok(status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseInviteStatusError {
    value: String,
}

impl fmt::Display for ParseInviteStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid status '{}': expected one of {}",
            self.value,
            InviteStatus::ALL
                .iter()
                .map(|status| status.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl Error for ParseInviteStatusError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidStatusTransition {
    pub from: InviteStatus,
    pub to: InviteStatus,
}

impl fmt::Display for InvalidStatusTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid status transition: {} -> {}", self.from, self.to)
    }
}

impl Error for InvalidStatusTransition {}
