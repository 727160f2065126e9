use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub type MemberId = i32;

/// Row shape shared by the roots, children and search endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FamilyMember {
    pub id: MemberId,
    pub full_name: String,
    pub photo_url: Option<String>,
    pub spouse_id: Option<MemberId>,
    pub order_id: i32,
}

/// A member joined with their spouse's name and photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PersonDetail {
    pub id: MemberId,
    pub full_name: String,
    pub photo_url: Option<String>,
    pub spouse_id: Option<MemberId>,
    pub order_id: i32,
    pub spouse_name: Option<String>,
    pub spouse_photo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyView {
    pub person: Option<PersonDetail>,
    pub children: Vec<FamilyMember>,
}

#[derive(Debug, Deserialize)]
pub struct ChildrenQuery {
    pub parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FamilyQuery {
    pub person_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}
