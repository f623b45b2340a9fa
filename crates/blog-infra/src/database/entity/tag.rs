//! Tag entity for SeaORM.

use async_trait::async_trait;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};

use crate::database::postgres_base::Keyed;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_type = "String(StringLen::N(20))", unique)]
    pub title: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post_tag::Entity")]
    PostTags,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        super::post_tag::Relation::Post.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::post_tag::Relation::Tag.def().rev())
    }
}

/// Lower-cases the title on every ActiveModel write, including writes that
/// never went through the domain `Clean` step.
#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let normalized = match &self.title {
            ActiveValue::Set(title) => Some(blog_core::domain::Tag::normalize_title(title)),
            _ => None,
        };
        if let Some(title) = normalized {
            self.title = Set(title);
        }
        Ok(self)
    }
}

/// Conversion from SeaORM Model to Domain Tag.
impl From<Model> for blog_core::domain::Tag {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
        }
    }
}

/// Conversion from Domain Tag to SeaORM ActiveModel.
impl From<blog_core::domain::Tag> for ActiveModel {
    fn from(tag: blog_core::domain::Tag) -> Self {
        Self {
            id: Set(tag.id),
            title: Set(tag.title),
        }
    }
}

impl Keyed<Uuid> for blog_core::domain::Tag {
    fn key(&self) -> Uuid {
        self.id
    }
}
