use crate::budget_repo::BudgetRepoError::{BudgetNotFound, TagNotFound};
use crate::budget_repo::{
    spending_window, Budget, BudgetCategory, BudgetRepo, BudgetRepoError, NewBudget,
    NewBudgetCategory,
};
use crate::mem_repo::{now, BudgetCategoryRecord, BudgetRecord, MemRepo, State};
use crate::user_repo::UserId;
use async_trait::async_trait;

impl State {
    fn owned_budget(&self, user: UserId, budget_id: i32) -> Option<&BudgetRecord> {
        self.budgets.get(&budget_id).filter(|b| b.user_id == user)
    }

    fn to_budget(&self, id: i32, record: &BudgetRecord) -> Budget {
        let window = spending_window(record.start_date, record.end_date);
        let categories = self
            .budget_categories
            .iter()
            .filter(|(_, c)| c.budget_id == id)
            .filter_map(|(category_id, c)| {
                let tag = self.tags.get(&c.tag_id)?;
                Some(BudgetCategory {
                    id: *category_id,
                    tag_id: c.tag_id,
                    amount_minor: c.amount_minor,
                    spent_minor: self.expense_sum(record.user_id, window, Some(c.tag_id)),
                    tag_name: tag.name.clone(),
                    tag_color: tag.color.clone(),
                    tag_icon: tag.icon.clone(),
                })
            })
            .collect();

        Budget {
            id,
            name: record.name.clone(),
            amount_minor: record.amount_minor,
            spent_minor: self.expense_sum(record.user_id, window, None),
            period: record.period,
            start_date: record.start_date,
            end_date: record.end_date,
            is_active: record.is_active,
            created_at: record.created_at,
            categories,
        }
    }

    fn check_category_tags(
        &self,
        user: UserId,
        categories: &[NewBudgetCategory],
    ) -> Result<(), BudgetRepoError> {
        match categories
            .iter()
            .find(|c| self.usable_tag(user, c.tag_id).is_none())
        {
            Some(c) => Err(TagNotFound(c.tag_id)),
            None => Ok(()),
        }
    }

    fn insert_categories(&mut self, budget_id: i32, categories: Vec<NewBudgetCategory>) {
        for c in categories {
            let id = self.next_budget_category_id;
            self.next_budget_category_id += 1;
            self.budget_categories.insert(
                id,
                BudgetCategoryRecord {
                    budget_id,
                    tag_id: c.tag_id,
                    amount_minor: c.amount_minor,
                },
            );
        }
    }
}

#[async_trait]
impl BudgetRepo for MemRepo {
    async fn get_active_budgets(&self, user: UserId) -> Result<Vec<Budget>, BudgetRepoError> {
        let read_guard = self.read_lock()?;

        let mut budgets: Vec<Budget> = read_guard
            .budgets
            .iter()
            .filter(|(_, b)| b.user_id == user && b.is_active)
            .map(|(id, b)| read_guard.to_budget(*id, b))
            .collect();
        budgets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(budgets)
    }

    async fn get_budget(&self, user: UserId, budget_id: i32) -> Result<Budget, BudgetRepoError> {
        let read_guard = self.read_lock()?;

        read_guard
            .owned_budget(user, budget_id)
            .map(|b| read_guard.to_budget(budget_id, b))
            .ok_or(BudgetNotFound(budget_id))
    }

    async fn create_budget(
        &self,
        user: UserId,
        new_budget: NewBudget,
    ) -> Result<Budget, BudgetRepoError> {
        let mut write_guard = self.write_lock()?;

        write_guard.check_category_tags(user, &new_budget.categories)?;

        let id = write_guard.next_budget_id;
        write_guard.next_budget_id += 1;

        write_guard.budgets.insert(
            id,
            BudgetRecord {
                user_id: user,
                name: new_budget.name,
                amount_minor: new_budget.amount_minor,
                period: new_budget.period,
                start_date: new_budget.start_date,
                end_date: new_budget.end_date,
                is_active: new_budget.is_active,
                created_at: now(),
            },
        );
        write_guard.insert_categories(id, new_budget.categories);

        let record = write_guard.budgets.get(&id).ok_or(BudgetNotFound(id))?;
        Ok(write_guard.to_budget(id, record))
    }

    async fn update_budget(
        &self,
        user: UserId,
        budget_id: i32,
        updated_budget: NewBudget,
    ) -> Result<Budget, BudgetRepoError> {
        let mut write_guard = self.write_lock()?;

        if write_guard.owned_budget(user, budget_id).is_none() {
            return Err(BudgetNotFound(budget_id));
        }
        write_guard.check_category_tags(user, &updated_budget.categories)?;

        let record = write_guard
            .budgets
            .get_mut(&budget_id)
            .ok_or(BudgetNotFound(budget_id))?;
        record.name = updated_budget.name;
        record.amount_minor = updated_budget.amount_minor;
        record.period = updated_budget.period;
        record.start_date = updated_budget.start_date;
        record.end_date = updated_budget.end_date;
        record.is_active = updated_budget.is_active;

        write_guard
            .budget_categories
            .retain(|_, c| c.budget_id != budget_id);
        write_guard.insert_categories(budget_id, updated_budget.categories);

        let record = write_guard
            .budgets
            .get(&budget_id)
            .ok_or(BudgetNotFound(budget_id))?;
        Ok(write_guard.to_budget(budget_id, record))
    }

    async fn delete_budget(
        &self,
        user: UserId,
        budget_id: i32,
    ) -> Result<Budget, BudgetRepoError> {
        let mut write_guard = self.write_lock()?;

        let budget = write_guard
            .owned_budget(user, budget_id)
            .map(|b| write_guard.to_budget(budget_id, b))
            .ok_or(BudgetNotFound(budget_id))?;

        write_guard.budgets.remove(&budget_id);
        write_guard
            .budget_categories
            .retain(|_, c| c.budget_id != budget_id);
        Ok(budget)
    }
}
