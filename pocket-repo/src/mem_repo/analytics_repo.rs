use crate::analytics_repo::{
    AnalyticsRepo, AnalyticsRepoError, CategoryTotal, DirectionTotals, Window,
};
use crate::mem_repo::MemRepo;
use crate::transaction_repo::Direction;
use crate::user_repo::UserId;
use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
impl AnalyticsRepo for MemRepo {
    async fn get_totals(
        &self,
        user: UserId,
        window: Window,
    ) -> Result<DirectionTotals, AnalyticsRepoError> {
        let read_guard = self.read_lock()?;

        let mut totals = DirectionTotals::default();
        for t in read_guard
            .transactions
            .values()
            .filter(|t| t.user_id == user && window.contains(t.occurred_at))
        {
            match t.direction {
                Direction::Income => totals.income_minor += t.amount_minor,
                Direction::Expense => totals.expense_minor += t.amount_minor,
            }
        }
        Ok(totals)
    }

    async fn get_expense_categories(
        &self,
        user: UserId,
        window: Window,
        limit: i64,
    ) -> Result<Vec<CategoryTotal>, AnalyticsRepoError> {
        let read_guard = self.read_lock()?;

        let mut groups: HashMap<Option<i32>, CategoryTotal> = HashMap::new();
        let expenses = read_guard.transactions.iter().filter(|(_, t)| {
            t.user_id == user
                && t.direction == Direction::Expense
                && window.contains(t.occurred_at)
        });
        for (id, t) in expenses {
            let tags = read_guard.tag_refs(*id);
            let keys: Vec<Option<i32>> = if tags.is_empty() {
                vec![None]
            } else {
                tags.iter().map(|tag| Some(tag.id)).collect()
            };
            for key in keys {
                let group = groups.entry(key).or_insert_with(|| {
                    let tag = key.and_then(|tag_id| tags.iter().find(|tag| tag.id == tag_id));
                    CategoryTotal {
                        tag_id: key,
                        name: tag.map(|tag| tag.name.clone()),
                        color: tag.and_then(|tag| tag.color.clone()),
                        icon: tag.and_then(|tag| tag.icon.clone()),
                        total_minor: 0,
                        count: 0,
                    }
                });
                group.total_minor += t.amount_minor;
                group.count += 1;
            }
        }

        let mut categories: Vec<CategoryTotal> = groups.into_values().collect();
        categories.sort_by(|a, b| {
            b.total_minor
                .cmp(&a.total_minor)
                .then_with(|| a.tag_id.cmp(&b.tag_id))
        });
        categories.truncate(limit.max(0) as usize);
        Ok(categories)
    }
}
