use sea_orm::entity::prelude::*;
use sea_orm::Set;

use crate::models::ProductSnapshot;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub order_id: i64,
    pub product_id: Option<i64>,
    pub quantity: i32,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub product_info: Option<Json>,
}

impl Model {
    /// Product details as they were when the order was placed.
    pub fn product_info(&self) -> Option<ProductSnapshot> {
        self.product_info
            .clone()
            .and_then(|value| serde_json::from_value(value).ok())
    }
}

impl ActiveModel {
    pub fn set_product_info(&mut self, snapshot: &ProductSnapshot) {
        self.product_info = Set(serde_json::to_value(snapshot).ok());
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::orders::Entity",
        from = "Column::OrderId",
        to = "super::orders::Column::Id",
        on_delete = "Cascade"
    )]
    Orders,
    #[sea_orm(
        belongs_to = "super::products::Entity",
        from = "Column::ProductId",
        to = "super::products::Column::Id",
        on_delete = "SetNull"
    )]
    Products,
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
