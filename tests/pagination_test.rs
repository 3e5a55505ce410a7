mod common;

use std::collections::HashSet;

use anyhow::Result;
use casher::domain::{LedgerEngine, NewOperation, OperationType, DEFAULT_PAGE_SIZE};
use chrono::SecondsFormat;
use common::{
    expected_subjects, insert_operation_row, raw_pool, register, seed_operations, subjects,
    test_services, test_setup,
};

#[tokio::test]
async fn test_page_size_is_five() -> Result<()> {
    let (services, _temp) = test_services().await?;
    assert_eq!(services.operations.page_size(), 5);
    assert_eq!(DEFAULT_PAGE_SIZE, 5);
    Ok(())
}

#[tokio::test]
async fn test_second_page_of_seven_operations() -> Result<()> {
    let (services, _temp) = test_services().await?;
    let user = register(&services, "anna").await?;
    seed_operations(&services, &user, 7).await?;

    let page = services.operations.list(user.id, 2).await?;
    // 6th and 7th most recent
    assert_eq!(subjects(&page.operations), expected_subjects((1..=2).rev()));
    assert!(!page.has_more);
    Ok(())
}

#[tokio::test]
async fn test_twelve_operations_across_three_pages() -> Result<()> {
    let (services, _temp) = test_services().await?;
    let user = register(&services, "anna").await?;
    seed_operations(&services, &user, 12).await?;

    let first = services.operations.list(user.id, 1).await?;
    assert_eq!(subjects(&first.operations), expected_subjects((8..=12).rev()));
    assert!(first.has_more);

    let second = services.operations.list(user.id, 2).await?;
    assert_eq!(subjects(&second.operations), expected_subjects((3..=7).rev()));
    assert!(second.has_more);

    let third = services.operations.list(user.id, 3).await?;
    assert_eq!(subjects(&third.operations), expected_subjects((1..=2).rev()));
    assert!(!third.has_more);
    Ok(())
}

#[tokio::test]
async fn test_empty_ledger_and_page_past_end() -> Result<()> {
    let (services, _temp) = test_services().await?;
    let user = register(&services, "anna").await?;

    let page = services.operations.list(user.id, 1).await?;
    assert!(page.is_empty());
    assert!(!page.has_more);

    seed_operations(&services, &user, 3).await?;
    let page = services.operations.list(user.id, 4).await?;
    assert!(page.is_empty());
    assert!(!page.has_more);
    Ok(())
}

#[tokio::test]
async fn test_page_zero_returns_everything() -> Result<()> {
    let (services, _temp) = test_services().await?;
    let user = register(&services, "anna").await?;
    seed_operations(&services, &user, 13).await?;

    let page = services.operations.list(user.id, 0).await?;
    assert_eq!(page.len(), 13);
    assert!(!page.has_more);
    assert_eq!(subjects(&page.operations), expected_subjects((1..=13).rev()));
    Ok(())
}

#[tokio::test]
async fn test_walking_pages_yields_every_operation_once() -> Result<()> {
    let (services, repo, _temp) = test_setup().await?;
    let user = register(&services, "anna").await?;
    let saved = seed_operations(&services, &user, 11).await?;
    let engine = LedgerEngine::new(&repo);

    for size in [1, 2, 3, 5, 10, 11, 12] {
        let mut seen = Vec::new();
        let mut page_number = 1;
        loop {
            let page = engine.get_page(user.id, page_number, size).await?;
            assert!(page.len() <= size as usize);
            seen.extend(page.operations.iter().map(|op| op.id));
            if !page.has_more {
                break;
            }
            page_number += 1;
        }

        let expected: Vec<i64> = saved.iter().rev().map(|op| op.id).collect();
        assert_eq!(seen, expected, "page size {}", size);
        assert_eq!(seen.iter().collect::<HashSet<_>>().len(), saved.len());
    }

    for (page, size) in [(0, 3), (2, 0)] {
        let all = engine.get_page(user.id, page, size).await?;
        assert_eq!(all.len(), saved.len());
        assert!(!all.has_more);
    }
    Ok(())
}

#[tokio::test]
async fn test_history_ordering_is_newest_first_with_ids_descending() -> Result<()> {
    let (services, _temp) = test_services().await?;
    let user = register(&services, "anna").await?;
    seed_operations(&services, &user, 20).await?;

    let history = services.operations.history(user.id).await?;
    for pair in history.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
        assert!(pair[0].id > pair[1].id);
    }
    Ok(())
}

#[tokio::test]
async fn test_identical_timestamps_page_by_id_descending() -> Result<()> {
    let (services, repo, temp) = test_setup().await?;
    let user = register(&services, "anna").await?;
    let pool = raw_pool(&temp).await?;

    let mut ids = Vec::new();
    for n in 1..=12 {
        let id = insert_operation_row(
            &pool,
            user.id,
            OperationType::Deposit,
            n * 100,
            &format!("op {}", n),
            "2024-01-01T00:00:00.000000Z",
        )
        .await?;
        ids.push(id);
    }
    ids.reverse();

    let engine = LedgerEngine::new(&repo);
    for size in [1u32, 4, 5, 12] {
        let mut seen = Vec::new();
        let mut page = 1;
        loop {
            let result = engine.get_page(user.id, page, size).await?;
            assert!(result.len() <= size as usize);
            seen.extend(result.operations.iter().map(|op| op.id));
            if !result.has_more {
                break;
            }
            page += 1;
        }
        assert_eq!(seen, ids, "page size {}", size);
    }

    let all = engine.get_page(user.id, 0, 0).await?;
    assert_eq!(all.operations.iter().map(|op| op.id).collect::<Vec<_>>(), ids);
    Ok(())
}

#[tokio::test]
async fn test_new_operation_sorts_first_after_clock_steps_back() -> Result<()> {
    let (services, _repo, temp) = test_setup().await?;
    let anna = register(&services, "anna").await?;
    let boris = register(&services, "boris").await?;
    let pool = raw_pool(&temp).await?;

    let future = "2999-01-01T00:00:00.000000Z";
    insert_operation_row(&pool, anna.id, OperationType::Deposit, 100, "from the future", future)
        .await?;

    let saved = services
        .operations
        .create(NewOperation::deposit(anna.id, 200, "latest"))
        .await?;
    assert_eq!(saved.created_at.to_rfc3339_opts(SecondsFormat::Micros, true), future);

    let page = services.operations.list(anna.id, 1).await?;
    assert_eq!(subjects(&page.operations), ["latest", "from the future"]);
    assert_eq!(page.operations[0].created_at, saved.created_at);

    let other = services
        .operations
        .create(NewOperation::deposit(boris.id, 300, "unaffected"))
        .await?;
    assert!(other.created_at < saved.created_at);
    Ok(())
}

#[tokio::test]
async fn test_pages_only_show_own_operations() -> Result<()> {
    let (services, _temp) = test_services().await?;
    let anna = register(&services, "anna").await?;
    let boris = register(&services, "boris").await?;
    seed_operations(&services, &anna, 6).await?;
    seed_operations(&services, &boris, 2).await?;

    let page = services.operations.list(boris.id, 1).await?;
    assert_eq!(page.len(), 2);
    assert!(!page.has_more);
    assert!(page.operations.iter().all(|op| op.user_id == boris.id));
    Ok(())
}
