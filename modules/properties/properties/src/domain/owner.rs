use chrono::{DateTime, Utc};
use modkit_docstore::collection::parse_object_id;
use modkit_docstore::{DecodeError, Document, Factory, ObjectId, StorageRecord, doc};
use modkit_errors::AppError;
use properties_sdk::{Metadata, NewOwnerParams, Owner};
use validator::Validate;

use super::fields::OwnerFields;
use super::{FactoryConfig, InvalidConfigFactory, corrupt, rejected};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerRecord {
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    pub telephone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StorageRecord for OwnerRecord {
    fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        Ok(Self {
            id: doc.get_object_id(OwnerFields::ID)?,
            name: doc.get_str(OwnerFields::NAME)?.to_owned(),
            email: doc.get_str(OwnerFields::EMAIL)?.to_owned(),
            telephone: doc.get_str(OwnerFields::TELEPHONE)?.to_owned(),
            created_at: doc.get_datetime(OwnerFields::CREATED_AT)?,
            updated_at: doc.get_datetime(OwnerFields::UPDATED_AT)?,
        })
    }

    fn to_document(&self) -> Document {
        doc! {
            OwnerFields::ID => self.id,
            OwnerFields::NAME => self.name.as_str(),
            OwnerFields::EMAIL => self.email.as_str(),
            OwnerFields::TELEPHONE => self.telephone.as_str(),
            "Metadata" => doc! {
                "CreatedAt" => self.created_at,
                "UpdatedAt" => self.updated_at,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct OwnerFactory {
    config: FactoryConfig,
}

impl OwnerFactory {
    /// # Errors
    /// [`InvalidConfigFactory`] when `config` is out of range.
    pub fn new(config: FactoryConfig) -> Result<Self, InvalidConfigFactory> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> FactoryConfig {
        self.config
    }

    /// # Errors
    /// A domain-layer `InvalidArgument` when the result breaks an owner rule.
    pub fn new_owner(&self, params: NewOwnerParams) -> Result<Owner, AppError> {
        let owner = Owner {
            id: params.id.unwrap_or_else(|| ObjectId::new().to_hex()),
            name: params.name,
            email: params.email,
            telephone: params.telephone,
            metadata: Metadata::created_now(),
        };
        owner.validate().map_err(rejected)?;
        Ok(owner)
    }
}

impl Factory for OwnerFactory {
    type Domain = Owner;
    type Record = OwnerRecord;

    fn to_domain(&self, record: OwnerRecord) -> Result<Owner, AppError> {
        let owner = Owner {
            id: record.id.to_hex(),
            name: record.name,
            email: record.email,
            telephone: record.telephone,
            metadata: Metadata {
                created_at: record.created_at,
                updated_at: record.updated_at,
            },
        };
        owner.validate().map_err(corrupt)?;
        Ok(owner)
    }

    fn to_database(&self, owner: &Owner) -> Result<OwnerRecord, AppError> {
        owner.validate().map_err(rejected)?;
        Ok(OwnerRecord {
            id: parse_object_id(&owner.id)?,
            name: owner.name.clone(),
            email: owner.email.clone(),
            telephone: owner.telephone.clone(),
            created_at: owner.metadata.created_at,
            updated_at: owner.metadata.updated_at,
        })
    }
}
