use crate::mem_repo::{now, MemRepo, State, TransactionRecord};
use crate::transaction_repo::TransactionRepoError::{TagNotFound, TransactionNotFound};
use crate::transaction_repo::{
    Filter, NewTransaction, PageOptions, Transaction, TransactionPage, TransactionRepo,
    TransactionRepoError,
};
use crate::user_repo::UserId;
use async_trait::async_trait;

impl State {
    fn owned_transaction(&self, user: UserId, transaction_id: i32) -> Option<&TransactionRecord> {
        self.transactions
            .get(&transaction_id)
            .filter(|t| t.user_id == user)
    }

    fn link_tag(
        &mut self,
        user: UserId,
        transaction_id: i32,
        tag_id: Option<i32>,
    ) -> Result<(), TransactionRepoError> {
        if let Some(tag_id) = tag_id {
            if self.usable_tag(user, tag_id).is_none() {
                return Err(TagNotFound(tag_id));
            }
            self.transaction_tags.insert((transaction_id, tag_id));
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionRepo for MemRepo {
    async fn get_transaction(
        &self,
        user: UserId,
        transaction_id: i32,
    ) -> Result<Transaction, TransactionRepoError> {
        let read_guard = self.read_lock()?;

        let record = read_guard
            .owned_transaction(user, transaction_id)
            .ok_or(TransactionNotFound(transaction_id))?;
        Ok(read_guard.to_transaction(transaction_id, record))
    }

    async fn get_transactions(
        &self,
        user: UserId,
        filter: Filter,
        page_options: Option<PageOptions>,
    ) -> Result<TransactionPage, TransactionRepoError> {
        let read_guard = self.read_lock()?;

        let mut transactions: Vec<Transaction> = read_guard
            .transactions
            .iter()
            .filter(|(_, t)| t.user_id == user)
            .filter(|(_, t)| filter.direction.map_or(true, |d| t.direction == d))
            .filter(|(id, _)| {
                filter
                    .tag_id
                    .map_or(true, |tag_id| read_guard.has_tag(**id, tag_id))
            })
            .map(|(id, t)| read_guard.to_transaction(*id, t))
            .collect();
        transactions.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

        let total = transactions.len() as i64;
        let transactions = match page_options {
            Some(page_options) => transactions
                .into_iter()
                .skip(page_options.offset.max(0) as usize)
                .take(page_options.limit.max(0) as usize)
                .collect(),
            None => transactions,
        };

        Ok(TransactionPage {
            transactions,
            total,
        })
    }

    async fn create_new_transaction(
        &self,
        user: UserId,
        new_transaction: NewTransaction,
    ) -> Result<Transaction, TransactionRepoError> {
        let mut write_guard = self.write_lock()?;

        if let Some(tag_id) = new_transaction.tag_id {
            if write_guard.usable_tag(user, tag_id).is_none() {
                return Err(TagNotFound(tag_id));
            }
        }

        let id = write_guard.next_transaction_id;
        write_guard.next_transaction_id += 1;

        let now = now();
        let record = TransactionRecord {
            user_id: user,
            amount_minor: new_transaction.amount_minor,
            currency: new_transaction.currency,
            direction: new_transaction.direction,
            occurred_at: new_transaction.occurred_at,
            description: new_transaction.description,
            merchant: new_transaction.merchant,
            created_at: now,
            updated_at: now,
        };
        write_guard.transactions.insert(id, record);
        write_guard.link_tag(user, id, new_transaction.tag_id)?;

        let record = write_guard
            .transactions
            .get(&id)
            .ok_or(TransactionNotFound(id))?;
        Ok(write_guard.to_transaction(id, record))
    }

    async fn update_transaction(
        &self,
        user: UserId,
        transaction_id: i32,
        updated_transaction: NewTransaction,
    ) -> Result<Transaction, TransactionRepoError> {
        let mut write_guard = self.write_lock()?;

        if write_guard
            .owned_transaction(user, transaction_id)
            .is_none()
        {
            return Err(TransactionNotFound(transaction_id));
        }
        if let Some(tag_id) = updated_transaction.tag_id {
            if write_guard.usable_tag(user, tag_id).is_none() {
                return Err(TagNotFound(tag_id));
            }
        }

        let record = write_guard
            .transactions
            .get_mut(&transaction_id)
            .ok_or(TransactionNotFound(transaction_id))?;
        record.amount_minor = updated_transaction.amount_minor;
        record.currency = updated_transaction.currency;
        record.direction = updated_transaction.direction;
        record.occurred_at = updated_transaction.occurred_at;
        record.description = updated_transaction.description;
        record.merchant = updated_transaction.merchant;
        record.updated_at = now();

        write_guard
            .transaction_tags
            .retain(|(t, _)| *t != transaction_id);
        write_guard.link_tag(user, transaction_id, updated_transaction.tag_id)?;

        let record = write_guard
            .transactions
            .get(&transaction_id)
            .ok_or(TransactionNotFound(transaction_id))?;
        Ok(write_guard.to_transaction(transaction_id, record))
    }

    async fn delete_transaction(
        &self,
        user: UserId,
        transaction_id: i32,
    ) -> Result<Transaction, TransactionRepoError> {
        let mut write_guard = self.write_lock()?;

        let transaction = write_guard
            .owned_transaction(user, transaction_id)
            .map(|record| write_guard.to_transaction(transaction_id, record))
            .ok_or(TransactionNotFound(transaction_id))?;

        write_guard.transactions.remove(&transaction_id);
        write_guard
            .transaction_tags
            .retain(|(t, _)| *t != transaction_id);
        Ok(transaction)
    }
}
