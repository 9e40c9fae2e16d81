//! Customer record management

use tracing::{info, instrument};

use crate::traits::*;
use crate::types::*;

/// Customer manager for handling customer records
pub struct CustomerManager<S: RecordStore> {
    storage: S,
    validator: Box<dyn CustomerValidator>,
    include_walk_in: bool,
}

impl<S: RecordStore> CustomerManager<S> {
    /// Create a new customer manager
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultCustomerValidator),
            include_walk_in: false,
        }
    }

    /// Create a new customer manager with custom validator
    pub fn with_validator(storage: S, validator: Box<dyn CustomerValidator>) -> Self {
        Self {
            storage,
            validator,
            include_walk_in: false,
        }
    }

    /// List walk-in customers alongside regular ones
    pub fn including_walk_in(mut self, include: bool) -> Self {
        self.include_walk_in = include;
        self
    }

    /// Create a new customer
    #[instrument(skip(self, new_customer), fields(name = %new_customer.name), err)]
    pub async fn create_customer(&mut self, new_customer: NewCustomer) -> WorkshopResult<Customer> {
        let mut customer = Customer::from_new(new_customer);
        self.validator.validate_customer(&customer)?;

        let receipt = self
            .storage
            .commit(UnitOfWork::new().with(Mutation::InsertCustomer(customer.clone())))
            .await?;
        customer.id = receipt.first_inserted()?;

        info!(customer_id = customer.id, "Created customer");
        Ok(customer)
    }

    /// Get a customer by ID
    pub async fn get_customer(&self, customer_id: CustomerId) -> WorkshopResult<Option<Customer>> {
        self.storage.find_customer_by_id(customer_id).await
    }

    /// Get a customer by ID, returning an error if not found
    pub async fn get_customer_required(&self, customer_id: CustomerId) -> WorkshopResult<Customer> {
        self.storage
            .find_customer_by_id(customer_id)
            .await?
            .ok_or(WorkshopError::CustomerNotFound(customer_id))
    }

    /// List customers. Walk-in customers are left out unless configured otherwise.
    pub async fn list_customers(&self) -> WorkshopResult<Vec<Customer>> {
        let filter = if self.include_walk_in {
            None
        } else {
            Some(CustomerType::Regular)
        };
        self.storage.list_customers(filter).await
    }

    /// Overwrite the fields supplied in `update`
    #[instrument(skip(self, update), err)]
    pub async fn update_customer(
        &mut self,
        customer_id: CustomerId,
        update: CustomerUpdate,
    ) -> WorkshopResult<Customer> {
        let mut customer = self.get_customer_required(customer_id).await?;
        update.apply_to(&mut customer);
        self.validator.validate_customer(&customer)?;

        self.storage
            .commit(UnitOfWork::new().with(Mutation::UpdateCustomer(customer.clone())))
            .await?;

        info!(customer_id, "Updated customer");
        Ok(customer)
    }

    /// Delete a customer. Their invoices stay as they are.
    #[instrument(skip(self), err)]
    pub async fn delete_customer(&mut self, customer_id: CustomerId) -> WorkshopResult<()> {
        let customer = self.get_customer_required(customer_id).await?;
        self.validator.validate_customer_deletion(&customer)?;

        self.storage
            .commit(UnitOfWork::new().with(Mutation::DeleteCustomer(customer_id)))
            .await?;

        info!(customer_id, "Deleted customer");
        Ok(())
    }
}
