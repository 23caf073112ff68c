use std::path::PathBuf;

use rockbands::cli::{print_json, Command};
use rockbands::{Entity, MembershipFields, NewAlbum, NewBand, NewMember, Store, StoreError};
use tempfile::TempDir;

fn temp_store() -> (TempDir, PathBuf, Store) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("rockbands.sqlite");
    let store = Store::open(&path).unwrap();
    (dir, path, store)
}

#[test]
fn records_survive_reopening_the_database() {
    let (_dir, path, mut store) = temp_store();

    let beatles = store
        .create_band(&NewBand::new("The Beatles").formed_in(1960).based_in("Liverpool"))
        .unwrap();
    let stones = store.create_band(&NewBand::new("The Rolling Stones")).unwrap();
    let paul = store
        .create_member(&NewMember::new("Paul McCartney").playing("Bass"))
        .unwrap();
    store
        .create_membership(
            &MembershipFields::new(beatles.id, paul.id)
                .as_role("Bass, vocals")
                .years(Some(1960), Some(1970)),
        )
        .unwrap();
    store
        .create_album(
            &NewAlbum::new("Abbey Road", beatles.id)
                .released_in(1969)
                .with_contributors([stones.id]),
        )
        .unwrap();
    store.close().unwrap();

    let store = Store::open(&path).unwrap();
    let detail = store.band_detail(beatles.id).unwrap();
    assert_eq!(detail.band.home_location.as_deref(), Some("Liverpool"));
    assert_eq!(detail.lineup.len(), 1);
    assert_eq!(detail.lineup[0].member_name, "Paul McCartney");
    assert_eq!(detail.lineup[0].membership.tenure(), "1960-1970");
    assert_eq!(detail.albums.len(), 1);
    assert_eq!(detail.albums[0].contributor_names(), "The Rolling Stones");

    let contributed = store.contributed_albums(stones.id).unwrap();
    assert_eq!(contributed.len(), 1);
    assert_eq!(contributed[0].title, "Abbey Road");
}

#[test]
fn memberships_require_existing_band_and_member() {
    let (_dir, _path, store) = temp_store();
    let band = store.create_band(&NewBand::new("Ramones")).unwrap();

    let err = store
        .create_membership(&MembershipFields::new(band.id, 42))
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Referential {
            entity: Entity::Member,
            id: 42
        }
    ));
    assert!(store.band_lineup(band.id).unwrap().is_empty());
}

#[test]
fn album_with_unknown_primary_band_is_rejected() {
    let (_dir, _path, mut store) = temp_store();
    let err = store
        .create_album(&NewAlbum::new("Phantom", 9_999))
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert!(store.list_bands().unwrap().is_empty());
}

#[test]
fn deleting_memberships_and_bands() {
    let (_dir, _path, store) = temp_store();
    let band = store.create_band(&NewBand::new("Joy Division")).unwrap();
    let member = store.create_member(&NewMember::new("Ian Curtis")).unwrap();
    let membership = store
        .create_membership(&MembershipFields::new(band.id, member.id).as_role("Vocals"))
        .unwrap();

    let err = store.delete_band(band.id).unwrap_err();
    assert!(matches!(
        err,
        StoreError::HasDependents {
            memberships: 1,
            albums: 0,
            ..
        }
    ));

    store.delete_membership(membership.id).unwrap();
    assert!(store.delete_membership(membership.id).unwrap_err().is_not_found());
    // The member outlives the membership.
    assert_eq!(store.get_member(member.id).unwrap().name, "Ian Curtis");

    store.delete_band(band.id).unwrap();
    assert!(store.get_band(band.id).unwrap_err().is_not_found());
}

#[test]
fn listing_commands_print_json() {
    let (_dir, _path, mut store) = temp_store();
    let band = store
        .create_band(&NewBand::new("Pixies").formed_in(1986))
        .unwrap();
    let album = store
        .create_album(&NewAlbum::new("Doolittle", band.id).released_in(1989))
        .unwrap();

    let mut out = Vec::new();
    print_json(&store, &Command::Bands, &mut out).unwrap();
    let bands: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(bands[0]["name"], "Pixies");
    assert_eq!(bands[0]["id"], band.id);

    let mut out = Vec::new();
    print_json(&store, &Command::Album { id: album.id }, &mut out).unwrap();
    let detail: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(detail["title"], "Doolittle");
    assert_eq!(detail["primary_band"]["name"], "Pixies");
    assert_eq!(detail["contributors"], serde_json::json!([]));
}
