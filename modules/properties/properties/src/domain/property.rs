use chrono::{DateTime, Utc};
use modkit_docstore::collection::parse_object_id;
use modkit_docstore::{DecodeError, Document, Factory, ObjectId, StorageRecord, doc};
use modkit_errors::AppError;
use properties_sdk::{Metadata, NewPropertyParams, Property, SaleType};
use validator::Validate;

use super::fields::PropertyFields;
use super::{FactoryConfig, InvalidConfigFactory, corrupt, rejected};

/// Stored form of a [`Property`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyRecord {
    pub id: ObjectId,
    pub owner_id: ObjectId,
    pub category: String,
    pub description: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub available: bool,
    pub available_date: DateTime<Utc>,
    pub address: String,
    pub sale_type: SaleType,
    /// Search metadata surfaced by listings; never written.
    pub pagination_token: String,
}

fn sale_type(doc: &Document) -> Result<SaleType, DecodeError> {
    let code = doc.get_i64(PropertyFields::SALE_TYPE)?;
    u8::try_from(code)
        .ok()
        .and_then(|code| SaleType::try_from(code).ok())
        .ok_or_else(|| DecodeError::Invalid {
            field: PropertyFields::SALE_TYPE.to_owned(),
            reason: format!("unknown sale type {code}"),
        })
}

impl StorageRecord for PropertyRecord {
    fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        Ok(Self {
            id: doc.get_object_id(PropertyFields::ID)?,
            owner_id: doc.get_object_id(PropertyFields::OWNER_ID)?,
            category: doc.get_str(PropertyFields::CATEGORY)?.to_owned(),
            description: doc.get_str(PropertyFields::DESCRIPTION)?.to_owned(),
            title: doc.get_str(PropertyFields::TITLE)?.to_owned(),
            created_at: doc.get_datetime(PropertyFields::CREATED_AT)?,
            updated_at: doc.get_datetime(PropertyFields::UPDATED_AT)?,
            available: doc.get_bool(PropertyFields::AVAILABLE)?,
            available_date: doc.get_datetime(PropertyFields::AVAILABLE_DATE)?,
            address: doc.get_str(PropertyFields::ADDRESS)?.to_owned(),
            sale_type: sale_type(doc)?,
            pagination_token: doc
                .get_str_or_empty(PropertyFields::PAGINATION_TOKEN)?
                .to_owned(),
        })
    }

    fn to_document(&self) -> Document {
        doc! {
            PropertyFields::ID => self.id,
            PropertyFields::OWNER_ID => self.owner_id,
            PropertyFields::CATEGORY => self.category.as_str(),
            PropertyFields::DESCRIPTION => self.description.as_str(),
            PropertyFields::TITLE => self.title.as_str(),
            PropertyFields::METADATA => doc! {
                "CreatedAt" => self.created_at,
                "UpdatedAt" => self.updated_at,
            },
            PropertyFields::AVAILABLE => self.available,
            PropertyFields::AVAILABLE_DATE => self.available_date,
            PropertyFields::ADDRESS => self.address.as_str(),
            PropertyFields::SALE_TYPE => i64::from(self.sale_type.code()),
        }
    }
}

/// Creates, validates and maps [`Property`] records.
#[derive(Debug, Clone)]
pub struct PropertyFactory {
    config: FactoryConfig,
}

impl PropertyFactory {
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

    /// Build a fresh property, generating its id unless one was supplied.
    ///
    /// # Errors
    /// A domain-layer `InvalidArgument` when the result breaks a property rule.
    pub fn new_property(&self, params: NewPropertyParams) -> Result<Property, AppError> {
        let property = Property {
            id: params.id.unwrap_or_else(|| ObjectId::new().to_hex()),
            owner_id: params.owner_id,
            category: params.category,
            description: params.description,
            title: params.title,
            metadata: Metadata::created_now(),
            available: params.available,
            available_date: params.available_date,
            address: params.address,
            sale_type: params.sale_type,
            pagination_token: String::new(),
        };
        property.validate().map_err(rejected)?;
        Ok(property)
    }
}

impl Factory for PropertyFactory {
    type Domain = Property;
    type Record = PropertyRecord;

    fn to_domain(&self, record: PropertyRecord) -> Result<Property, AppError> {
        let property = Property {
            id: record.id.to_hex(),
            owner_id: record.owner_id.to_hex(),
            category: record.category,
            description: record.description,
            title: record.title,
            metadata: Metadata {
                created_at: record.created_at,
                updated_at: record.updated_at,
            },
            available: record.available,
            available_date: record.available_date,
            address: record.address,
            sale_type: record.sale_type,
            pagination_token: record.pagination_token,
        };
        property.validate().map_err(corrupt)?;
        Ok(property)
    }

    fn to_database(&self, property: &Property) -> Result<PropertyRecord, AppError> {
        property.validate().map_err(rejected)?;
        Ok(PropertyRecord {
            id: parse_object_id(&property.id)?,
            owner_id: parse_object_id(&property.owner_id)?,
            category: property.category.clone(),
            description: property.description.clone(),
            title: property.title.clone(),
            created_at: property.metadata.created_at,
            updated_at: property.metadata.updated_at,
            available: property.available,
            available_date: property.available_date,
            address: property.address.clone(),
            sale_type: property.sale_type,
            pagination_token: String::new(),
        })
    }
}
