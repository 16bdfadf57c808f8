//! Store field names.

pub struct PropertyFields;

impl PropertyFields {
    pub const ID: &'static str = "_id";
    pub const OWNER_ID: &'static str = "OwnerID";
    pub const CATEGORY: &'static str = "Category";
    pub const DESCRIPTION: &'static str = "Description";
    pub const TITLE: &'static str = "Title";
    pub const METADATA: &'static str = "Metadata";
    pub const CREATED_AT: &'static str = "Metadata.CreatedAt";
    pub const UPDATED_AT: &'static str = "Metadata.UpdatedAt";
    pub const AVAILABLE: &'static str = "Available";
    pub const AVAILABLE_DATE: &'static str = "AvailableDate";
    pub const ADDRESS: &'static str = "Address";
    pub const SALE_TYPE: &'static str = "SaleType";
    pub const PAGINATION_TOKEN: &'static str = "PaginationToken";

    /// Everything a listing projects besides `_id` and the pagination token.
    pub const LISTED: [&'static str; 9] = [
        Self::OWNER_ID,
        Self::CATEGORY,
        Self::DESCRIPTION,
        Self::TITLE,
        Self::METADATA,
        Self::AVAILABLE,
        Self::AVAILABLE_DATE,
        Self::ADDRESS,
        Self::SALE_TYPE,
    ];
}

pub struct OwnerFields;

impl OwnerFields {
    pub const ID: &'static str = "_id";
    pub const NAME: &'static str = "Name";
    pub const EMAIL: &'static str = "Email";
    pub const TELEPHONE: &'static str = "Telephone";
    pub const CREATED_AT: &'static str = "Metadata.CreatedAt";
    pub const UPDATED_AT: &'static str = "Metadata.UpdatedAt";
}
