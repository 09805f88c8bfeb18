//! MongoDB repository tests
//!
//! These start a MongoDB container, so they are ignored by default:
//!
//! ```bash
//! cargo test -p domain_users --test mongodb_test -- --ignored
//! ```

use domain_users::{MongoUserRepository, NewUser, UserError, UserFilter, UserRepository};
use mongodb::bson::oid::ObjectId;
use test_utils::{TestDataBuilder, TestMongo};

async fn repository(mongo: &TestMongo, builder: &TestDataBuilder) -> MongoUserRepository {
    let repo = MongoUserRepository::new(mongo.database(&builder.database()));
    repo.init_indexes().await.unwrap();
    repo
}

fn new_user(name: &str, email: &str, address: Option<&str>) -> NewUser {
    NewUser {
        name: name.to_string(),
        age: 30,
        email: email.to_string(),
        address: address.map(str::to_string),
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_crud_round_trip() {
    let mongo = TestMongo::new().await;
    let builder = TestDataBuilder::from_test_name("mongo_crud");
    let repo = repository(&mongo, &builder).await;

    let ann = repo
        .create(new_user("Ann", &builder.email("ann"), Some("Hanoi")))
        .await
        .unwrap();
    assert_eq!(ann.id.len(), 24);

    let found = repo.find_by_email(&ann.email).await.unwrap();
    assert_eq!(found.as_ref(), Some(&ann));

    let id = ObjectId::parse_str(&ann.id).unwrap();
    let updated = repo
        .update(id, new_user("Ann B", &ann.email, None))
        .await
        .unwrap();
    assert_eq!(updated.name, "Ann B");
    assert_eq!(updated.address, None);

    // A later read returns the new values
    let listed = repo
        .list(&UserFilter {
            search: Some(ann.email.clone()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(listed, vec![updated]);

    repo.delete(id).await.unwrap();
    assert!(matches!(repo.delete(id).await, Err(UserError::NotFound(_))));
    assert!(matches!(
        repo.update(id, new_user("Ann", &ann.email, None)).await,
        Err(UserError::NotFound(_))
    ));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_unique_index_reports_duplicate_email() {
    let mongo = TestMongo::new().await;
    let builder = TestDataBuilder::from_test_name("mongo_unique");
    let repo = repository(&mongo, &builder).await;
    let email = builder.email("ann");

    repo.create(new_user("Ann", &email, None)).await.unwrap();
    let err = repo.create(new_user("Other", &email, None)).await.unwrap_err();
    assert!(matches!(err, UserError::DuplicateEmail));

    // Running it twice is harmless
    repo.init_indexes().await.unwrap();
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_list_search_and_count() {
    let mongo = TestMongo::new().await;
    let builder = TestDataBuilder::from_test_name("mongo_list");
    let repo = repository(&mongo, &builder).await;

    for i in 0..7 {
        repo.create(new_user(&format!("User {i}"), &builder.email(&format!("u{i}")), None))
            .await
            .unwrap();
    }
    repo.create(new_user("Zed", &builder.email("zed"), Some("12 a.b street")))
        .await
        .unwrap();

    let second_page = UserFilter {
        page: 2,
        limit: 5,
        search: None,
    };
    let users = repo.list(&second_page).await.unwrap();
    let names: Vec<_> = users.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["User 5", "User 6", "Zed"]);
    assert_eq!(repo.count(&second_page).await.unwrap(), 8);

    let search = UserFilter {
        search: Some("USER".to_string()),
        ..Default::default()
    };
    assert_eq!(repo.count(&search).await.unwrap(), 7);

    // Metacharacters match literally
    let literal = UserFilter {
        search: Some("a.b".to_string()),
        ..Default::default()
    };
    let users = repo.list(&literal).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].name, "Zed");

    // Pages past the end are empty rather than rejected by the driver
    let far = UserFilter {
        page: u64::MAX,
        limit: 1_000,
        search: None,
    };
    assert!(repo.list(&far).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_insert_many_skips_duplicates() {
    let mongo = TestMongo::new().await;
    let builder = TestDataBuilder::from_test_name("mongo_insert_many");
    let repo = repository(&mongo, &builder).await;

    let ann = builder.email("ann");
    let bob = builder.email("bob");
    let inserted = repo
        .insert_many(vec![
            new_user("Ann", &ann, None),
            new_user("Ann Again", &ann, None),
            new_user("Bob", &bob, None),
        ])
        .await
        .unwrap();

    let names: Vec<_> = inserted.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["Ann", "Bob"]);
    assert_eq!(repo.count(&UserFilter::default()).await.unwrap(), 2);

    let taken = repo
        .existing_emails(vec![ann.clone(), builder.email("nobody")])
        .await
        .unwrap();
    assert_eq!(taken, vec![ann]);
}
