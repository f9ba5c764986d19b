//! Record type
//!
//! A record is a destination-tagged set of fields with an optional
//! identifier. Producers create records without identifiers; the identity
//! resolver assigns one exactly once during pre-processing.

use crate::error::{Error, Result};
use crate::fields::Fields;
use crate::value::Value;

/// A destination-tagged entity with an optional identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    destination_id: String,
    identifier: Option<String>,
    fields: Fields,
}

impl Record {
    /// Create a record without an identifier.
    ///
    /// # Errors
    /// Returns `InvalidRecord` if `destination_id` is empty.
    pub fn new(destination_id: impl Into<String>, fields: Fields) -> Result<Self> {
        let destination_id = destination_id.into();
        if destination_id.is_empty() {
            return Err(Error::InvalidRecord(
                "destination_id must not be empty".to_string(),
            ));
        }
        Ok(Record {
            destination_id,
            identifier: None,
            fields,
        })
    }

    /// Create a record carrying an explicit identifier from upstream
    pub fn with_identifier(
        destination_id: impl Into<String>,
        identifier: impl Into<String>,
        fields: Fields,
    ) -> Result<Self> {
        let mut record = Record::new(destination_id, fields)?;
        record.identifier = Some(identifier.into());
        Ok(record)
    }

    /// Destination this record belongs to
    pub fn destination_id(&self) -> &str {
        &self.destination_id
    }

    /// Overwrite the destination (used by destination normalization)
    pub fn set_destination_id(&mut self, destination_id: impl Into<String>) -> Result<()> {
        let destination_id = destination_id.into();
        if destination_id.is_empty() {
            return Err(Error::InvalidRecord(
                "destination_id must not be empty".to_string(),
            ));
        }
        self.destination_id = destination_id;
        Ok(())
    }

    /// Identifier, if one has been assigned
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// Check whether an identifier has been assigned
    pub fn has_identifier(&self) -> bool {
        self.identifier.is_some()
    }

    /// Assign an identifier unless one is already present.
    ///
    /// Returns `true` if the identifier was assigned. An existing identifier
    /// is never replaced.
    pub fn assign_identifier(&mut self, identifier: impl Into<String>) -> bool {
        if self.identifier.is_some() {
            return false;
        }
        self.identifier = Some(identifier.into());
        true
    }

    /// Field map
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Mutable field map
    pub fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    /// Get one field value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Check the record's invariants.
    ///
    /// Records built through the constructors always pass; this guards
    /// batches assembled by hand before they reach the batcher.
    pub fn validate(&self) -> Result<()> {
        if self.destination_id.is_empty() {
            return Err(Error::InvalidRecord(
                "destination_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Split into destination, identifier and fields
    pub fn into_parts(self) -> (String, Option<String>, Fields) {
        (self.destination_id, self.identifier, self.fields)
    }
}
