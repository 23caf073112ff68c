//! Error taxonomy for the relational store. Callers above the store (the TUI
//! and the CLI) fold these into `anyhow::Error`, but the variants stay typed so
//! each presentation surface can decide how to render them.

use std::fmt;

use thiserror::Error;

/// Which table an identity belongs to. Used to build readable error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Band,
    Member,
    Membership,
    Album,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Band => "Band",
            Entity::Member => "Member",
            Entity::Membership => "Membership",
            Entity::Album => "Album",
        };
        f.write_str(name)
    }
}

/// A single rejected form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Every field error found while checking one request. Parsing collects all of
/// them instead of stopping at the first so a form can show the full list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// True when any error is attached to `field`.
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|err| err.field == field)
    }

    /// `Ok(())` when nothing was collected, otherwise the whole list.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for err in &self.0 {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{err}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Failures reported by [`crate::db::Store`] operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A required field was missing, empty, too long or inconsistent.
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// A supplied foreign key does not point at an existing row.
    #[error("{entity} {id} does not exist.")]
    Referential { entity: Entity, id: i64 },

    /// The addressed row does not exist.
    #[error("{entity} {id} not found.")]
    NotFound { entity: Entity, id: i64 },

    /// Deleting the row would orphan memberships or albums.
    #[error("{entity} {id} still has {memberships} membership(s) and {albums} album(s).")]
    HasDependents {
        entity: Entity,
        id: i64,
        memberships: i64,
        albums: i64,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("could not prepare database location: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub(crate) fn not_found(entity: Entity, id: i64) -> Self {
        StoreError::NotFound { entity, id }
    }

    pub(crate) fn referential(entity: Entity, id: i64) -> Self {
        StoreError::Referential { entity, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
