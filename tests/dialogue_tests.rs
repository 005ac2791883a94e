//! # Dialogue Tests
//!
//! Drives the note state machine against an in-memory store and checks the
//! replies, the next state and the resulting note sequence.

mod common;

use anyhow::Result;
use common::note_texts;
use notekeeper::bot::ui_builder::TELEGRAM_MAX_LEN;
use notekeeper::bot::{advance, Transition};
use notekeeper::dialogue::NoteDialogueState;
use notekeeper::storage::{MemoryStore, NoteStore};

const USER: i64 = 1001;
const EN: Option<&str> = Some("en");

async fn store_with(notes: &[&str]) -> Result<MemoryStore> {
    let store = MemoryStore::new();
    for note in notes {
        store.append_note(USER, note).await?;
    }
    Ok(store)
}

async fn send(store: &MemoryStore, state: NoteDialogueState, text: &str) -> Result<Transition> {
    advance(store, USER, text, state, EN).await
}

#[tokio::test]
async fn test_unknown_text_shows_help_with_keyboard() -> Result<()> {
    let store = store_with(&[]).await?;
    let t = send(&store, NoteDialogueState::Idle, "hello").await?;

    assert_eq!(t.next, NoteDialogueState::Idle);
    assert!(t.reply.with_keyboard);
    assert!(t.reply.text.contains("/start"));
    Ok(())
}

#[tokio::test]
async fn test_add_flow_appends_trimmed_note_last() -> Result<()> {
    let store = store_with(&["existing"]).await?;

    let t = send(&store, NoteDialogueState::Idle, "📝 Add").await?;
    assert_eq!(t.next, NoteDialogueState::Add);

    let t = send(&store, t.next, "  buy bread  ").await?;
    assert_eq!(t.next, NoteDialogueState::Idle);
    assert_eq!(t.reply.text, "✅ Note added!");
    assert_eq!(note_texts(&store, USER).await?, vec!["existing", "buy bread"]);
    Ok(())
}

#[tokio::test]
async fn test_add_empty_note_is_not_saved() -> Result<()> {
    let store = store_with(&["existing"]).await?;

    let t = send(&store, NoteDialogueState::Add, "   \n ").await?;
    assert_eq!(t.next, NoteDialogueState::Idle);
    assert_eq!(t.reply.text, "❌ An empty note was not saved.");
    assert_eq!(note_texts(&store, USER).await?, vec!["existing"]);
    Ok(())
}

#[tokio::test]
async fn test_button_label_is_input_while_awaiting() -> Result<()> {
    let store = store_with(&[]).await?;

    let t = send(&store, NoteDialogueState::Add, "📋 List").await?;
    assert_eq!(t.next, NoteDialogueState::Idle);
    assert_eq!(note_texts(&store, USER).await?, vec!["📋 List"]);
    Ok(())
}

#[tokio::test]
async fn test_list_renders_numbered_notes() -> Result<()> {
    let store = store_with(&["buy milk", "call mom"]).await?;

    let t = send(&store, NoteDialogueState::Idle, "📋 List").await?;
    assert_eq!(t.next, NoteDialogueState::Idle);
    assert_eq!(t.reply.text, "Your notes:\n\n1. buy milk\n2. call mom");

    let empty = store_with(&[]).await?;
    let t = send(&empty, NoteDialogueState::Idle, "📋 List").await?;
    assert_eq!(t.reply.text, "📭 You have no notes yet.");
    Ok(())
}

#[tokio::test]
async fn test_long_listings_are_sent_in_parts() -> Result<()> {
    let first = "a".repeat(3000);
    let second = "b".repeat(3000);
    let store = store_with(&[&first, &second]).await?;

    for menu in ["📋 List", "✏️ Edit", "🗑 Delete"] {
        let t = send(&store, NoteDialogueState::Idle, menu).await?;
        assert!(t.reply.text.len() > TELEGRAM_MAX_LEN, "{menu}");

        let parts = t.reply.chunks();
        assert!(parts.len() >= 2, "{menu}");
        assert!(parts.iter().all(|p| p.text.len() <= TELEGRAM_MAX_LEN), "{menu}");

        let joined: String = parts.iter().map(|p| p.text.as_str()).collect();
        assert!(joined.contains(&format!("1. {first}")), "{menu}");
        assert!(joined.contains(&format!("2. {second}")), "{menu}");

        let (last, rest) = parts.split_last().unwrap();
        assert_eq!(last.with_keyboard, t.reply.with_keyboard, "{menu}");
        assert!(rest.iter().all(|p| !p.with_keyboard), "{menu}");
    }

    // The delete listing still resolves positions against both notes
    let t = send(&store, NoteDialogueState::Idle, "🗑 Delete").await?;
    let t = send(&store, t.next, "2").await?;
    assert_eq!(t.next, NoteDialogueState::Idle);
    assert_eq!(note_texts(&store, USER).await?, vec![first]);
    Ok(())
}

#[tokio::test]
async fn test_short_reply_is_one_part_with_its_keyboard() -> Result<()> {
    let store = store_with(&[]).await?;
    let t = send(&store, NoteDialogueState::Idle, "hello").await?;

    assert_eq!(t.reply.chunks(), vec![t.reply.clone()]);
    Ok(())
}

#[tokio::test]
async fn test_edit_and_delete_without_notes_stay_idle() -> Result<()> {
    let store = store_with(&[]).await?;

    let t = send(&store, NoteDialogueState::Idle, "✏️ Edit").await?;
    assert_eq!(t.next, NoteDialogueState::Idle);
    assert_eq!(t.reply.text, "📭 No notes to edit.");

    let t = send(&store, NoteDialogueState::Idle, "🗑 Delete").await?;
    assert_eq!(t.next, NoteDialogueState::Idle);
    assert_eq!(t.reply.text, "📭 No notes to delete.");
    Ok(())
}

#[tokio::test]
async fn test_delete_scenario() -> Result<()> {
    let store = store_with(&["buy milk", "call mom"]).await?;

    let t = send(&store, NoteDialogueState::Idle, "🗑 Delete").await?;
    assert!(matches!(t.next, NoteDialogueState::Delete { ref listed } if listed.len() == 2));
    assert!(t.reply.text.contains("1. buy milk\n2. call mom"));

    let t = send(&store, t.next, "1").await?;
    assert_eq!(t.next, NoteDialogueState::Idle);
    assert_eq!(t.reply.text, "🗑 Deleted: buy milk");
    assert_eq!(note_texts(&store, USER).await?, vec!["call mom"]);
    assert_eq!(store.count_notes(USER).await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_edit_changes_exactly_one_note() -> Result<()> {
    let store = store_with(&["a", "b", "c"]).await?;

    let t = send(&store, NoteDialogueState::Idle, "✏️ Edit").await?;
    assert!(matches!(t.next, NoteDialogueState::EditIndex { .. }));

    let t = send(&store, t.next, " 2 ").await?;
    assert!(matches!(t.next, NoteDialogueState::EditContent { .. }));
    assert_eq!(t.reply.text, "✏️ Enter the new text of the note:");

    let t = send(&store, t.next, "  B  ").await?;
    assert_eq!(t.next, NoteDialogueState::Idle);
    assert_eq!(t.reply.text, "✅ Note updated!");
    assert_eq!(note_texts(&store, USER).await?, vec!["a", "B", "c"]);
    Ok(())
}

#[tokio::test]
async fn test_edit_with_empty_text_keeps_note() -> Result<()> {
    let store = store_with(&["a"]).await?;

    let t = send(&store, NoteDialogueState::Idle, "✏️ Edit").await?;
    let t = send(&store, t.next, "1").await?;
    let t = send(&store, t.next, "   ").await?;

    assert_eq!(t.next, NoteDialogueState::Idle);
    assert_eq!(t.reply.text, "❌ Empty text was not saved.");
    assert_eq!(note_texts(&store, USER).await?, vec!["a"]);
    Ok(())
}

#[tokio::test]
async fn test_invalid_positions_abort_without_changes() -> Result<()> {
    for menu in ["✏️ Edit", "🗑 Delete"] {
        for input in ["0", "3", "-1", "99999999999999999999"] {
            let store = store_with(&["a", "b"]).await?;
            let listing = send(&store, NoteDialogueState::Idle, menu).await?;

            let t = send(&store, listing.next, input).await?;
            assert_eq!(t.next, NoteDialogueState::Idle, "{menu} {input}");
            assert_eq!(note_texts(&store, USER).await?, vec!["a", "b"]);
            assert!(t.reply.text.starts_with("❌"), "{menu} {input}: {}", t.reply.text);
        }

        let store = store_with(&["a", "b"]).await?;
        let listing = send(&store, NoteDialogueState::Idle, menu).await?;
        let t = send(&store, listing.next, "two").await?;
        assert_eq!(t.next, NoteDialogueState::Idle);
        assert_eq!(t.reply.text, "❌ Enter a number.");
        assert_eq!(note_texts(&store, USER).await?, vec!["a", "b"]);
    }
    Ok(())
}

#[tokio::test]
async fn test_out_of_range_reply() -> Result<()> {
    let store = store_with(&["a", "b"]).await?;
    let listing = send(&store, NoteDialogueState::Idle, "🗑 Delete").await?;
    let t = send(&store, listing.next, "3").await?;
    assert_eq!(t.reply.text, "❌ Invalid note number.");
    Ok(())
}

#[tokio::test]
async fn test_concurrent_append_does_not_retarget_delete() -> Result<()> {
    let store = store_with(&["b", "c"]).await?;
    let listing = send(&store, NoteDialogueState::Idle, "🗑 Delete").await?;

    // Another device deletes "b" after the list was shown
    store.delete_note_at(USER, 0).await?;
    store.append_note(USER, "d").await?;

    // Position 2 was "c" when listed and still addresses it
    let t = send(&store, listing.next.clone(), "2").await?;
    assert_eq!(t.reply.text, "🗑 Deleted: c");
    assert_eq!(note_texts(&store, USER).await?, vec!["d"]);

    // Position 1 was "b", which is gone now
    let t = send(&store, listing.next, "1").await?;
    assert_eq!(t.next, NoteDialogueState::Idle);
    assert_eq!(t.reply.text, "❌ That note no longer exists.");
    assert_eq!(note_texts(&store, USER).await?, vec!["d"]);
    Ok(())
}

#[tokio::test]
async fn test_edit_of_note_deleted_elsewhere_reports_it() -> Result<()> {
    let store = store_with(&["a"]).await?;
    let listing = send(&store, NoteDialogueState::Idle, "✏️ Edit").await?;
    let chosen = send(&store, listing.next, "1").await?;

    store.delete_note_at(USER, 0).await?;

    let t = send(&store, chosen.next, "new text").await?;
    assert_eq!(t.next, NoteDialogueState::Idle);
    assert_eq!(t.reply.text, "❌ That note no longer exists.");
    assert!(note_texts(&store, USER).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_russian_labels_and_replies() -> Result<()> {
    let store = store_with(&[]).await?;

    let t = advance(&store, USER, "📝 Добавить", NoteDialogueState::Idle, Some("ru")).await?;
    assert_eq!(t.next, NoteDialogueState::Add);
    assert_eq!(t.reply.text, "✏️ Введите текст новой заметки:");

    let t = advance(&store, USER, "заметка", t.next, Some("ru-RU")).await?;
    assert_eq!(t.reply.text, "✅ Заметка добавлена!");

    // English labels work for a Russian-speaking user too
    let t = advance(&store, USER, "📋 List", NoteDialogueState::Idle, Some("ru")).await?;
    assert_eq!(t.reply.text, "Ваши заметки:\n\n1. заметка");
    Ok(())
}

#[tokio::test]
async fn test_notes_are_kept_per_user() -> Result<()> {
    let store = store_with(&["mine"]).await?;
    store.append_note(2002, "theirs").await?;

    let t = send(&store, NoteDialogueState::Idle, "📋 List").await?;
    assert_eq!(t.reply.text, "Your notes:\n\n1. mine");
    Ok(())
}
