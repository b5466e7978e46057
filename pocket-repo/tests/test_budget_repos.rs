mod utils;

use chrono::{NaiveDate, NaiveDateTime};
use pocket_repo::budget_repo::{BudgetPeriod, BudgetRepoError, NewBudget, NewBudgetCategory};
use pocket_repo::transaction_repo::Direction;
use rstest::rstest;
use utils::generator::NewTransactionGenerator;
use utils::test_user::TestUser;
use utils::RepoType;

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

fn at(month: u32, day: u32, hour: u32) -> NaiveDateTime {
    date(month, day).and_hms_opt(hour, 0, 0).unwrap()
}

fn march_budget(categories: Vec<NewBudgetCategory>) -> NewBudget {
    NewBudget {
        name: "March".to_owned(),
        amount_minor: 100_000,
        period: BudgetPeriod::Monthly,
        start_date: date(3, 1),
        end_date: date(3, 31),
        is_active: true,
        categories,
    }
}

#[rstest]
#[case::sqlx(RepoType::SQLx)]
#[case::mem(RepoType::Mem)]
#[actix_rt::test]
async fn test_create_and_get_budget(#[case] repo_type: RepoType) {
    let Some(repos) = utils::build_repos(repo_type).await else {
        return;
    };
    let user = TestUser::new(&repos.user_repo).await;
    let tags = repos.tag_repo.get_visible_tags(user.id).await.unwrap();

    let new_budget = march_budget(vec![
        NewBudgetCategory {
            tag_id: tags[0].id,
            amount_minor: 30_000,
        },
        NewBudgetCategory {
            tag_id: tags[1].id,
            amount_minor: 20_000,
        },
    ]);
    let created = repos
        .budget_repo
        .create_budget(user.id, new_budget.clone())
        .await
        .unwrap();
    assert_eq!(created.name, new_budget.name);
    assert_eq!(created.period, BudgetPeriod::Monthly);
    assert_eq!(created.spent_minor, 0);
    assert_eq!(created.categories.len(), 2);
    assert_eq!(created.categories[0].tag_id, tags[0].id);
    assert_eq!(created.categories[0].tag_name, tags[0].name);
    assert_eq!(created.categories[1].amount_minor, 20_000);

    let stored = repos
        .budget_repo
        .get_budget(user.id, created.id)
        .await
        .unwrap();
    assert_eq!(stored, created);

    user.delete().await;
}

#[rstest]
#[case::sqlx(RepoType::SQLx)]
#[case::mem(RepoType::Mem)]
#[actix_rt::test]
async fn test_spent_is_computed_from_expenses(#[case] repo_type: RepoType) {
    let Some(repos) = utils::build_repos(repo_type).await else {
        return;
    };
    let user = TestUser::new(&repos.user_repo).await;
    let tag_id = repos.tag_repo.get_visible_tags(user.id).await.unwrap()[0].id;

    let budget = repos
        .budget_repo
        .create_budget(
            user.id,
            march_budget(vec![NewBudgetCategory {
                tag_id,
                amount_minor: 10_000,
            }]),
        )
        .await
        .unwrap();

    let mut generator = NewTransactionGenerator::default()
        .with_amounts(vec![1_000, 2_500, 4_000, 8_000, 16_000])
        .with_directions(vec![
            Direction::Expense,
            Direction::Expense,
            Direction::Expense,
            Direction::Income,
            Direction::Expense,
        ])
        .with_dates(vec![
            at(3, 1, 0),
            at(3, 31, 23),
            at(3, 15, 12),
            at(3, 10, 9),
            at(4, 1, 0),
        ])
        .with_tags(vec![Some(tag_id), None, Some(tag_id), Some(tag_id), Some(tag_id)]);
    for new_transaction in generator.generate_many(5) {
        repos
            .transaction_repo
            .create_new_transaction(user.id, new_transaction)
            .await
            .unwrap();
    }

    let budget = repos
        .budget_repo
        .get_budget(user.id, budget.id)
        .await
        .unwrap();
    // Both ends of the date range are inclusive, income never counts
    assert_eq!(budget.spent_minor, 1_000 + 2_500 + 4_000);
    assert_eq!(budget.categories[0].spent_minor, 1_000 + 4_000);

    user.delete().await;
}

#[rstest]
#[case::sqlx(RepoType::SQLx)]
#[case::mem(RepoType::Mem)]
#[actix_rt::test]
async fn test_active_budgets(#[case] repo_type: RepoType) {
    let Some(repos) = utils::build_repos(repo_type).await else {
        return;
    };
    let user = TestUser::new(&repos.user_repo).await;

    let first = repos
        .budget_repo
        .create_budget(user.id, march_budget(vec![]))
        .await
        .unwrap();
    let second = repos
        .budget_repo
        .create_budget(user.id, march_budget(vec![]))
        .await
        .unwrap();
    let mut inactive = march_budget(vec![]);
    inactive.is_active = false;
    repos
        .budget_repo
        .create_budget(user.id, inactive)
        .await
        .unwrap();

    let budgets = repos.budget_repo.get_active_budgets(user.id).await.unwrap();
    assert_eq!(
        budgets.iter().map(|b| b.id).collect::<Vec<i32>>(),
        vec![second.id, first.id]
    );
    assert!(budgets.iter().all(|b| b.categories.is_empty()));

    user.delete().await;
}

#[rstest]
#[case::sqlx(RepoType::SQLx)]
#[case::mem(RepoType::Mem)]
#[actix_rt::test]
async fn test_update_budget_replaces_categories(#[case] repo_type: RepoType) {
    let Some(repos) = utils::build_repos(repo_type).await else {
        return;
    };
    let user = TestUser::new(&repos.user_repo).await;
    let tags = repos.tag_repo.get_visible_tags(user.id).await.unwrap();

    let budget = repos
        .budget_repo
        .create_budget(
            user.id,
            march_budget(vec![NewBudgetCategory {
                tag_id: tags[0].id,
                amount_minor: 10_000,
            }]),
        )
        .await
        .unwrap();

    let mut replacement = march_budget(vec![NewBudgetCategory {
        tag_id: tags[2].id,
        amount_minor: 5_000,
    }]);
    replacement.name = "Spring".to_owned();
    replacement.period = BudgetPeriod::Yearly;
    replacement.is_active = false;
    let updated = repos
        .budget_repo
        .update_budget(user.id, budget.id, replacement)
        .await
        .unwrap();
    assert_eq!(updated.id, budget.id);
    assert_eq!(updated.name, "Spring");
    assert_eq!(updated.period, BudgetPeriod::Yearly);
    assert!(!updated.is_active);
    assert_eq!(updated.categories.len(), 1);
    assert_eq!(updated.categories[0].tag_id, tags[2].id);

    let active = repos.budget_repo.get_active_budgets(user.id).await.unwrap();
    assert!(active.is_empty());

    user.delete().await;
}

#[rstest]
#[case::sqlx(RepoType::SQLx)]
#[case::mem(RepoType::Mem)]
#[actix_rt::test]
async fn test_budget_with_unknown_tag(#[case] repo_type: RepoType) {
    let Some(repos) = utils::build_repos(repo_type).await else {
        return;
    };
    let user = TestUser::new(&repos.user_repo).await;

    let result = repos
        .budget_repo
        .create_budget(
            user.id,
            march_budget(vec![NewBudgetCategory {
                tag_id: -5,
                amount_minor: 100,
            }]),
        )
        .await;
    assert!(matches!(result, Err(BudgetRepoError::TagNotFound(-5))));

    let budgets = repos.budget_repo.get_active_budgets(user.id).await.unwrap();
    assert!(budgets.is_empty());

    user.delete().await;
}

#[rstest]
#[case::sqlx(RepoType::SQLx)]
#[case::mem(RepoType::Mem)]
#[actix_rt::test]
async fn test_budgets_are_private(#[case] repo_type: RepoType) {
    let Some(repos) = utils::build_repos(repo_type).await else {
        return;
    };
    let user1 = TestUser::new(&repos.user_repo).await;
    let user2 = TestUser::new(&repos.user_repo).await;

    let budget = repos
        .budget_repo
        .create_budget(user1.id, march_budget(vec![]))
        .await
        .unwrap();

    let result = repos.budget_repo.get_budget(user2.id, budget.id).await;
    assert!(matches!(result, Err(BudgetRepoError::BudgetNotFound(_))));

    let result = repos
        .budget_repo
        .update_budget(user2.id, budget.id, march_budget(vec![]))
        .await;
    assert!(matches!(result, Err(BudgetRepoError::BudgetNotFound(_))));

    let result = repos.budget_repo.delete_budget(user2.id, budget.id).await;
    assert!(matches!(result, Err(BudgetRepoError::BudgetNotFound(_))));

    user1.delete().await;
    user2.delete().await;
}

#[rstest]
#[case::sqlx(RepoType::SQLx)]
#[case::mem(RepoType::Mem)]
#[actix_rt::test]
async fn test_delete_budget(#[case] repo_type: RepoType) {
    let Some(repos) = utils::build_repos(repo_type).await else {
        return;
    };
    let user = TestUser::new(&repos.user_repo).await;

    let budget = repos
        .budget_repo
        .create_budget(user.id, march_budget(vec![]))
        .await
        .unwrap();

    let deleted = repos
        .budget_repo
        .delete_budget(user.id, budget.id)
        .await
        .unwrap();
    assert_eq!(deleted.id, budget.id);

    let result = repos.budget_repo.get_budget(user.id, budget.id).await;
    assert!(matches!(result, Err(BudgetRepoError::BudgetNotFound(_))));

    user.delete().await;
}
