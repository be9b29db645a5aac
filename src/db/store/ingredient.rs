use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{SqliteStore, expect_affected, require};
use crate::cid::Cid;
use crate::db::access::observe;
use crate::db::models::Ingredient;
use crate::db::scan;
use crate::db::statements::{STATEMENTS, alias};
use crate::db::traits::IngredientStore;
use crate::error::StoreResult;

#[async_trait]
impl IngredientStore for SqliteStore {
    async fn select_all_ingredients(&self, cid: &Cid) -> StoreResult<Vec<Ingredient>> {
        observe("SelectAllIngredients", None, cid, async {
            self.select_many(&STATEMENTS.ingredient.select_all, None, |row| {
                scan::ingredient(row, alias::INGREDIENT)
            })
            .await
        })
        .await
    }

    async fn select_ingredient(&self, id: Uuid, cid: &Cid) -> StoreResult<Ingredient> {
        observe("SelectIngredient", Some(id), cid, async {
            self.select_one(&STATEMENTS.ingredient.select, id, "ingredient", |row| {
                scan::ingredient(row, alias::INGREDIENT)
            })
            .await
        })
        .await
    }

    async fn insert_ingredient(&self, ingredient: &Ingredient, cid: &Cid) -> StoreResult<Ingredient> {
        let id = observe("InsertIngredient", None, cid, async {
            require("ingredient", "name", &ingredient.name)?;
            let now = Utc::now();
            self.insert_row("ingredients", |id| {
                sqlx::query(&STATEMENTS.ingredient.insert)
                    .bind(id)
                    .bind(ingredient.name.as_str())
                    .bind(now)
                    .bind(now)
            })
            .await
        })
        .await?;
        self.select_ingredient(id, cid).await
    }

    async fn update_ingredient(&self, ingredient: &Ingredient, cid: &Cid) -> StoreResult<Ingredient> {
        observe("UpdateIngredient", Some(ingredient.id), cid, async {
            require("ingredient", "name", &ingredient.name)?;
            let affected = sqlx::query(&STATEMENTS.ingredient.update)
                .bind(ingredient.name.as_str())
                .bind(Utc::now())
                .bind(ingredient.id)
                .execute(&self.pool)
                .await?
                .rows_affected();
            expect_affected(affected, "ingredient", ingredient.id)
        })
        .await?;
        self.select_ingredient(ingredient.id, cid).await
    }

    async fn delete_ingredient(&self, id: Uuid, cid: &Cid) -> StoreResult<()> {
        observe("DeleteIngredient", Some(id), cid, async {
            self.soft_delete(&STATEMENTS.ingredient.delete, "ingredient", id).await
        })
        .await
    }
}
