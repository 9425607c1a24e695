//! Note store: sticky notes, most recently edited first.

use async_trait::async_trait;
use std::sync::{Arc, Weak};
use tokio::sync::RwLock;
use tracing::debug;

use crate::engine::SyncEngine;
use crate::error::{SyncError, SyncResult};
use crate::stores::ReloadTarget;
use startdeck_core::tables;
use startdeck_core::validation::{validate_note, validate_note_color};
use startdeck_core::Note;
use startdeck_db::Database;

pub struct NoteStore {
    db: Arc<Database>,
    engine: Arc<SyncEngine>,
    notes: RwLock<Vec<Note>>,
}

impl NoteStore {
    /// Loads the notes and registers the store for reload after a pull.
    pub async fn load(db: Arc<Database>, engine: Arc<SyncEngine>) -> SyncResult<Arc<Self>> {
        let store = Arc::new(NoteStore {
            db,
            engine,
            notes: RwLock::new(Vec::new()),
        });
        store.refresh().await?;

        let weak = Arc::downgrade(&store);
        let target: Weak<dyn ReloadTarget> = weak;
        store.engine.register_reload_target(target).await;
        Ok(store)
    }

    pub async fn list(&self) -> Vec<Note> {
        self.notes.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Note> {
        self.notes.read().await.iter().find(|n| n.id == id).cloned()
    }

    pub async fn add(&self, title: &str, content: &str) -> SyncResult<Note> {
        let note = Note::new(title.trim(), content);
        validate_note(&note)?;

        self.db.notes().put(&note).await?;
        self.notes.write().await.insert(0, note.clone());
        debug!(id = %note.id, "Note added");

        self.engine.update().await;
        Ok(note)
    }

    /// Replaces the body of a note.
    pub async fn edit(&self, id: &str, content: &str) -> SyncResult<Note> {
        let mut note = self.require(id).await?;
        note.edit(content);
        validate_note(&note)?;
        self.save(note).await
    }

    pub async fn set_color(&self, id: &str, color: &str) -> SyncResult<Note> {
        validate_note_color(color)?;
        let mut note = self.require(id).await?;
        note.color = color.to_string();
        self.save(note).await
    }

    /// Removes a note. Returns whether it existed.
    pub async fn remove(&self, id: &str) -> SyncResult<bool> {
        let existed = self.db.notes().delete(id).await?;
        if existed {
            self.notes.write().await.retain(|n| n.id != id);
            debug!(id = %id, "Note removed");
            self.engine.update().await;
        }
        Ok(existed)
    }

    async fn require(&self, id: &str) -> SyncResult<Note> {
        self.get(id).await.ok_or_else(|| SyncError::RecordNotFound {
            table: tables::NOTE.into(),
            id: id.to_string(),
        })
    }

    async fn save(&self, note: Note) -> SyncResult<Note> {
        self.db.notes().put(&note).await?;
        {
            let mut notes = self.notes.write().await;
            notes.retain(|n| n.id != note.id);
            notes.insert(0, note.clone());
        }
        self.engine.update().await;
        Ok(note)
    }

    async fn refresh(&self) -> SyncResult<()> {
        let mut notes = self.db.notes().list().await?;
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        *self.notes.write().await = notes;
        Ok(())
    }
}

#[async_trait]
impl ReloadTarget for NoteStore {
    fn name(&self) -> &'static str {
        "notes"
    }

    async fn reload(&self) -> SyncResult<()> {
        self.refresh().await
    }
}
