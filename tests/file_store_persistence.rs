//! Persistence through the file-backed store.

use testresult::TestResult;

use storefront::{
    auth::{LoginForm, SocialProvider},
    catalog::Catalog,
    config::ShopConfig,
    products::ProductId,
    storage::{FileStore, KeyValueStore, StorageKeys},
    storefront::Storefront,
};

fn open(store: FileStore) -> TestResult<Storefront<FileStore>> {
    Ok(Storefront::open(store, Catalog::bundled()?, ShopConfig::instant())?)
}

#[test]
fn cart_and_session_are_written_as_json_files() -> TestResult {
    let dir = tempfile::tempdir()?;
    let keys = StorageKeys::default();

    {
        let mut shop = open(FileStore::open(dir.path())?)?;
        shop.login(&LoginForm::new("kirby@dreamland.kr", "warpstar123"))?;
        shop.add_to_cart(ProductId(1), 2, "")?;
    }

    assert!(dir.path().join(format!("{}.json", keys.cart)).is_file());
    assert!(dir.path().join(format!("{}.json", keys.token)).is_file());

    let shop = open(FileStore::open(dir.path())?)?;

    assert!(shop.auth().is_authenticated());
    assert_eq!(shop.cart().quantity_of(ProductId(1), ""), 2);

    Ok(())
}

#[test]
fn corrupt_files_are_discarded() -> TestResult {
    let dir = tempfile::tempdir()?;
    let keys = StorageKeys::default();

    let mut store = FileStore::open(dir.path())?;
    store.set(&keys.cart, "[{\"broken\": ")?;
    store.set(&keys.wishlist, "not json at all")?;

    let shop = open(store)?;

    assert!(shop.cart().is_empty());
    assert!(shop.wishlist().is_empty());
    assert!(!dir.path().join(format!("{}.json", keys.cart)).exists());

    Ok(())
}

#[test]
fn logout_removes_session_files() -> TestResult {
    let dir = tempfile::tempdir()?;
    let keys = StorageKeys::default();

    let mut shop = open(FileStore::open(dir.path())?)?;
    shop.social_login(SocialProvider::Naver)?;
    shop.toggle_wishlist(ProductId(10))?;
    shop.logout()?;

    assert!(!dir.path().join(format!("{}.json", keys.user)).exists());
    assert!(!dir.path().join(format!("{}.json", keys.token)).exists());

    let reopened = open(FileStore::open(dir.path())?)?;

    assert!(!reopened.auth().is_authenticated());
    assert!(reopened.wishlist().contains(ProductId(10)));

    Ok(())
}

#[test]
fn binary_files_are_discarded() -> TestResult {
    let dir = tempfile::tempdir()?;
    let keys = StorageKeys::default();
    let cart_file = dir.path().join(format!("{}.json", keys.cart));

    std::fs::write(&cart_file, [0xff, 0xfe, 0x5b])?;

    let shop = open(FileStore::open(dir.path())?)?;

    assert!(shop.cart().is_empty());
    assert!(!cart_file.exists());

    Ok(())
}
