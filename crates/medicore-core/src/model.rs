use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Entity models tracked by the caching layer.
///
/// These mirror the tables of the relational source-of-record. Appointment
/// references Patient and Doctor, MedicalRecord references Appointment (and
/// carries the patient id), Rating references Doctor via `staff_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Model {
    Patient,
    Doctor,
    Appointment,
    MedicalRecord,
    Rating,
    Staff,
    Organization,
}

impl Model {
    /// Returns the canonical model name as stored in write events.
    pub fn as_str(&self) -> &'static str {
        match self {
            Model::Patient => "Patient",
            Model::Doctor => "Doctor",
            Model::Appointment => "Appointment",
            Model::MedicalRecord => "MedicalRecord",
            Model::Rating => "Rating",
            Model::Staff => "Staff",
            Model::Organization => "Organization",
        }
    }

    /// All tracked models, in declaration order.
    pub const ALL: [Model; 7] = [
        Model::Patient,
        Model::Doctor,
        Model::Appointment,
        Model::MedicalRecord,
        Model::Rating,
        Model::Staff,
        Model::Organization,
    ];
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Model {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Patient" => Ok(Model::Patient),
            "Doctor" => Ok(Model::Doctor),
            "Appointment" => Ok(Model::Appointment),
            "MedicalRecord" => Ok(Model::MedicalRecord),
            "Rating" => Ok(Model::Rating),
            "Staff" => Ok(Model::Staff),
            "Organization" => Ok(Model::Organization),
            _ => Err(CoreError::unknown_model(s)),
        }
    }
}

/// Mutating actions observed on the source-of-record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteAction {
    Create,
    Update,
    Delete,
}

impl WriteAction {
    /// Returns the string representation of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteAction::Create => "create",
            WriteAction::Update => "update",
            WriteAction::Delete => "delete",
        }
    }

    /// All mutating actions.
    pub const ALL: [WriteAction; 3] =
        [WriteAction::Create, WriteAction::Update, WriteAction::Delete];
}

impl fmt::Display for WriteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_round_trip() {
        for model in Model::ALL {
            assert_eq!(model.as_str().parse::<Model>().unwrap(), model);
        }
    }

    #[test]
    fn unknown_model_rejected() {
        assert!("Invoice".parse::<Model>().is_err());
    }

    #[test]
    fn action_display() {
        assert_eq!(WriteAction::Create.to_string(), "create");
        assert_eq!(WriteAction::Delete.as_str(), "delete");
    }
}
