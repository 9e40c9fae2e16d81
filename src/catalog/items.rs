//! Inventory item management

use tracing::{info, instrument};

use crate::traits::*;
use crate::types::*;

/// Item manager for handling catalog and stock records
pub struct ItemManager<S: RecordStore> {
    storage: S,
    validator: Box<dyn ItemValidator>,
}

impl<S: RecordStore> ItemManager<S> {
    /// Create a new item manager
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultItemValidator),
        }
    }

    /// Create a new item manager with custom validator
    pub fn with_validator(storage: S, validator: Box<dyn ItemValidator>) -> Self {
        Self { storage, validator }
    }

    /// Create a new item
    #[instrument(skip(self, new_item), fields(product_code = %new_item.product_code), err)]
    pub async fn create_item(&mut self, new_item: NewItem) -> WorkshopResult<Item> {
        let mut item = Item::from_new(new_item);
        self.validator.validate_item(&item)?;
        self.ensure_unique_code(&item.product_code, None).await?;

        let receipt = self
            .storage
            .commit(UnitOfWork::new().with(Mutation::InsertItem(item.clone())))
            .await?;
        item.id = receipt.first_inserted()?;

        info!(item_id = item.id, "Created item");
        Ok(item)
    }

    /// Get an item by ID
    pub async fn get_item(&self, item_id: ItemId) -> WorkshopResult<Option<Item>> {
        self.storage.find_item_by_id(item_id).await
    }

    /// Get an item by ID, returning an error if not found
    pub async fn get_item_required(&self, item_id: ItemId) -> WorkshopResult<Item> {
        self.storage
            .find_item_by_id(item_id)
            .await?
            .ok_or(WorkshopError::ItemNotFound(item_id))
    }

    /// List all items
    pub async fn list_items(&self) -> WorkshopResult<Vec<Item>> {
        self.storage.list_items().await
    }

    /// Overwrite the fields supplied in `update`
    #[instrument(skip(self, update), err)]
    pub async fn update_item(&mut self, item_id: ItemId, update: ItemUpdate) -> WorkshopResult<Item> {
        let mut item = self.get_item_required(item_id).await?;
        update.apply_to(&mut item);
        self.validator.validate_item(&item)?;

        if update.product_code.is_some() {
            self.ensure_unique_code(&item.product_code, Some(item.id))
                .await?;
        }

        self.storage
            .commit(UnitOfWork::new().with(Mutation::UpdateItem(item.clone())))
            .await?;

        info!(item_id, "Updated item");
        Ok(item)
    }

    async fn ensure_unique_code(
        &self,
        product_code: &str,
        owner: Option<ItemId>,
    ) -> WorkshopResult<()> {
        match self.storage.find_item_by_product_code(product_code).await? {
            Some(existing) if Some(existing.id) != owner => Err(WorkshopError::Validation(
                format!("Product code '{}' is already in use", product_code),
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_storage::MemoryStore;
    use bigdecimal::BigDecimal;

    fn new_item(code: &str) -> NewItem {
        NewItem {
            name: "Chain kit".to_string(),
            price: BigDecimal::from(1800),
            purchase_price: BigDecimal::from(1300),
            product_code: code.to_string(),
            category: "Drive".to_string(),
            image_filename: Some("chain.jpg".to_string()),
            quantity: 5,
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch_item() {
        let mut items = ItemManager::new(MemoryStore::new());
        let item = items.create_item(new_item("CK-1")).await.unwrap();

        assert_eq!(item.id, 1);
        assert_eq!(items.get_item_required(1).await.unwrap(), item);
        assert_eq!(items.list_items().await.unwrap().len(), 1);
        assert!(items.get_item(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_product_code_rejected() {
        let mut items = ItemManager::new(MemoryStore::new());
        items.create_item(new_item("CK-1")).await.unwrap();

        let result = items.create_item(new_item("CK-1")).await;
        assert!(matches!(result, Err(WorkshopError::Validation(_))));
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let mut items = ItemManager::new(MemoryStore::new());
        let item = items.create_item(new_item("CK-1")).await.unwrap();

        let updated = items
            .update_item(
                item.id,
                ItemUpdate {
                    price: Some(BigDecimal::from(1950)),
                    quantity: Some(9),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.price, BigDecimal::from(1950));
        assert_eq!(updated.quantity, 9);
        assert_eq!(updated.name, "Chain kit");
        assert_eq!(updated.product_code, "CK-1");
        assert_eq!(updated.image_filename.as_deref(), Some("chain.jpg"));
    }

    #[tokio::test]
    async fn test_update_to_taken_code_rejected() {
        let mut items = ItemManager::new(MemoryStore::new());
        items.create_item(new_item("CK-1")).await.unwrap();
        let second = items.create_item(new_item("CK-2")).await.unwrap();

        let result = items
            .update_item(
                second.id,
                ItemUpdate {
                    product_code: Some("CK-1".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(result.is_err());

        // Re-submitting the item's own code is fine
        let same = items
            .update_item(
                second.id,
                ItemUpdate {
                    product_code: Some("CK-2".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(same.is_ok());
    }

    #[tokio::test]
    async fn test_update_missing_item() {
        let mut items = ItemManager::new(MemoryStore::new());
        let result = items.update_item(3, ItemUpdate::default()).await;
        assert!(matches!(result, Err(WorkshopError::ItemNotFound(3))));
    }
}
