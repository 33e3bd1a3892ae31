use predicates::prelude::*;

use guidebase::content::{ContentItem, Material};
use guidebase::schema::ContentKind;
use guidebase::store::Store;

#[test]
fn help_lists_the_subcommands() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("guidebase");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("extract")
                .and(predicate::str::contains("export-seed"))
                .and(predicate::str::contains("checklist")),
        );
}

#[test]
fn list_on_a_fresh_database_prints_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("guidebase.sqlite3");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("guidebase");
    cmd.arg("list")
        .arg("--db")
        .arg(&db)
        .assert()
        .success()
        .stdout("");
}

#[test]
fn show_of_an_unknown_id_fails_with_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("guidebase.sqlite3");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("guidebase");
    cmd.args(["show", "no-such-id", "--db"])
        .arg(&db)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn export_seed_prints_insert_statements() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("guidebase.sqlite3");

    let id = {
        let store = Store::open(&db).unwrap();
        let mut item = ContentItem::empty(ContentKind::Recipe, "Corn Chowder");
        item.materials = vec![Material {
            name: "corn".to_string(),
            quantity: Some("4".to_string()),
            unit: Some("ears".to_string()),
            notes: None,
            measurement: None,
        }];
        store.save(&item).unwrap()
    };

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("guidebase");
    cmd.args(["export-seed", id.as_str(), "--db"])
        .arg(&db)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("INSERT OR REPLACE INTO content_items")
                .and(predicate::str::contains("Corn Chowder"))
                .and(predicate::str::contains("INSERT OR REPLACE INTO materials")),
        );
}

#[test]
fn list_shows_stored_items_with_kind_and_title() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("guidebase.sqlite3");

    let id = {
        let store = Store::open(&db).unwrap();
        store
            .save(&ContentItem::empty(ContentKind::Tutorial, "Planter Box"))
            .unwrap()
    };

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("guidebase");
    cmd.arg("list")
        .arg("--db")
        .arg(&db)
        .assert()
        .success()
        .stdout(
            predicate::str::contains(id.as_str())
                .and(predicate::str::contains("tutorial"))
                .and(predicate::str::contains("Planter Box")),
        );
}
