use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{SelectedFileView, UploadedFile};

/// Local preview of a selected image, served while its selection lives.
#[derive(Debug, Clone)]
pub struct PreviewHandle {
    pub id: Uuid,
    pub file_name: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl PreviewHandle {
    pub fn url(&self) -> String {
        format!("/previews/{}", self.id)
    }
}

/// Live preview handles. Every handle is released when the selection that
/// created it goes away.
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    handles: HashMap<Uuid, Arc<PreviewHandle>>,
}

impl PreviewRegistry {
    fn create(&mut self, file: &UploadedFile) -> Uuid {
        let id = Uuid::new_v4();
        self.handles.insert(
            id,
            Arc::new(PreviewHandle {
                id,
                file_name: file.name.clone(),
                mime_type: file.mime_type.clone(),
                data: file.content.clone(),
            }),
        );
        id
    }

    fn release_all(&mut self) -> usize {
        let released = self.handles.len();
        self.handles.clear();
        released
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<PreviewHandle>> {
        self.handles.get(id).cloned()
    }

    pub fn live_count(&self) -> usize {
        self.handles.len()
    }
}

#[derive(Debug)]
struct SelectedEntry {
    file: UploadedFile,
    preview: Option<Uuid>,
}

/// Pending selection of the upload form.
#[derive(Debug, Default)]
pub struct FileIntake {
    selection: Option<Vec<SelectedEntry>>,
    previews: PreviewRegistry,
}

impl FileIntake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the pending selection. `None` or an empty list clears it.
    /// Previews of the previous selection are released first.
    pub fn accept_selection(&mut self, files: Option<Vec<UploadedFile>>) {
        let released = self.previews.release_all();
        if released > 0 {
            debug!(released, "Released preview handles of previous selection");
        }

        let files = files.filter(|files| !files.is_empty());
        self.selection = files.map(|files| {
            files
                .into_iter()
                .map(|file| {
                    let preview = file.is_image().then(|| self.previews.create(&file));
                    SelectedEntry { file, preview }
                })
                .collect()
        });

        info!(
            files = self.len(),
            previews = self.previews.live_count(),
            "Selection replaced"
        );
    }

    pub fn clear(&mut self) {
        self.accept_selection(None);
    }

    /// Hands the held selection over for extraction. The selection stays in
    /// place; an empty intake yields nothing.
    pub fn submit(&self) -> Option<Vec<UploadedFile>> {
        self.selection
            .as_ref()
            .map(|entries| entries.iter().map(|e| e.file.clone()).collect())
    }

    pub fn len(&self) -> usize {
        self.selection.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn preview(&self, id: &Uuid) -> Option<Arc<PreviewHandle>> {
        self.previews.get(id)
    }

    pub fn live_previews(&self) -> usize {
        self.previews.live_count()
    }

    pub fn views(&self) -> Vec<SelectedFileView> {
        self.selection
            .iter()
            .flatten()
            .map(|entry| SelectedFileView {
                name: entry.file.name.clone(),
                mime_type: entry.file.mime_type.clone(),
                size: entry.file.size,
                preview_url: entry
                    .preview
                    .and_then(|id| self.previews.get(&id))
                    .map(|handle| handle.url()),
            })
            .collect()
    }
}

impl Drop for FileIntake {
    fn drop(&mut self) {
        let released = self.previews.release_all();
        if released > 0 {
            debug!(released, "Released preview handles on teardown");
        }
    }
}
