#![allow(dead_code)]

//! Helpers shared by the integration tests

use anyhow::Result;
use notekeeper::note_model::NewUser;
use notekeeper::storage::NoteStore;

pub fn contents(notes: &[notekeeper::note_model::Note]) -> Vec<String> {
    notes.iter().map(|n| n.content.clone()).collect()
}

pub async fn note_texts(store: &dyn NoteStore, user_id: i64) -> Result<Vec<String>> {
    Ok(contents(&store.list_notes(user_id).await?))
}

/// Behaviour every storage backend must share
pub async fn exercise_store_contract(store: &dyn NoteStore, user_id: i64, other_id: i64) -> Result<()> {
    let profile = store
        .record_user(&NewUser {
            telegram_id: user_id,
            username: Some("tester".to_string()),
            first_name: Some("Test".to_string()),
            last_name: Some("User".to_string()),
        })
        .await?;
    assert_eq!(profile.telegram_id, user_id);

    // Insert-if-absent keeps the original profile
    let again = store
        .record_user(&NewUser {
            telegram_id: user_id,
            username: Some("renamed".to_string()),
            ..Default::default()
        })
        .await?;
    assert_eq!(again.username.as_deref(), Some("tester"));
    assert_eq!(again.first_seen, profile.first_seen);
    assert_eq!(store.get_user(user_id).await?, Some(profile.clone()));
    assert_eq!(store.get_user(other_id).await?, None);

    assert_eq!(store.count_notes(user_id).await?, 0);
    assert!(store.list_notes(user_id).await?.is_empty());

    // Appending puts the note last
    for text in ["first", "second", "third"] {
        let note = store.append_note(user_id, text).await?;
        assert_eq!(note.content, text);
        let listed = store.list_notes(user_id).await?;
        assert_eq!(listed.last(), Some(&note));
        assert_eq!(store.count_notes(user_id).await?, listed.len());
    }
    store.append_note(other_id, "foreign").await?;

    // Editing by position changes exactly one element
    assert!(store.update_note_at(user_id, 1, "SECOND").await?);
    assert_eq!(note_texts(store, user_id).await?, vec!["first", "SECOND", "third"]);
    assert!(!store.update_note_at(user_id, 3, "out of range").await?);

    // Editing by id
    let notes = store.list_notes(user_id).await?;
    assert!(store.update_note(user_id, notes[2].id, "THIRD").await?);
    assert_eq!(note_texts(store, user_id).await?, vec!["first", "SECOND", "THIRD"]);

    // Notes of another user are not reachable by id
    let foreign = store.list_notes(other_id).await?;
    assert!(!store.update_note(user_id, foreign[0].id, "hijack").await?);
    assert!(store.delete_note(user_id, foreign[0].id).await?.is_none());
    assert_eq!(note_texts(store, other_id).await?, vec!["foreign"]);

    // Deleting by position shifts later notes down
    let removed = store.delete_note_at(user_id, 0).await?.expect("note at position 0");
    assert_eq!(removed.content, "first");
    assert_eq!(note_texts(store, user_id).await?, vec!["SECOND", "THIRD"]);
    assert_eq!(store.count_notes(user_id).await?, 2);
    assert!(store.delete_note_at(user_id, 2).await?.is_none());

    // Deleting by id
    let notes = store.list_notes(user_id).await?;
    let removed = store.delete_note(user_id, notes[1].id).await?;
    assert_eq!(removed.map(|n| n.content), Some("THIRD".to_string()));
    assert!(store.delete_note(user_id, notes[1].id).await?.is_none());
    assert_eq!(note_texts(store, user_id).await?, vec!["SECOND"]);

    // Every recorded user is listed
    store.record_user(&NewUser::new(other_id)).await?;
    let ids: Vec<i64> = store.list_users().await?.iter().map(|u| u.telegram_id).collect();
    assert!(ids.contains(&user_id));
    assert!(ids.contains(&other_id));

    Ok(())
}
