use std::sync::Arc;

use shared::{
    catalog::Catalog,
    domain::{Project, ProjectId},
};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CarouselError {
    #[error("project {0} is not in the catalog")]
    UnknownProject(ProjectId),
    #[error("no project is selected")]
    NothingSelected,
    #[error("image index {index} is out of range for {len} images")]
    ImageOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarouselSelection {
    pub project_id: ProjectId,
    pub image_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarouselEvent {
    Opened { project_id: ProjectId },
    ImageChanged { project_id: ProjectId, index: usize },
    Closed { project_id: ProjectId },
}

/// Detail view state: which project is open and which of its images is shown.
pub struct CarouselController {
    catalog: Arc<Catalog>,
    selection: Option<CarouselSelection>,
    events: broadcast::Sender<CarouselEvent>,
}

impl CarouselController {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            catalog,
            selection: None,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CarouselEvent> {
        self.events.subscribe()
    }

    pub fn selection(&self) -> Option<CarouselSelection> {
        self.selection
    }

    pub fn selected(&self) -> Option<&Project> {
        self.selection
            .and_then(|selection| self.catalog.by_id(selection.project_id))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.selection.map(|selection| selection.image_index)
    }

    /// `None` when nothing is open or the open project has no images.
    pub fn current_image(&self) -> Option<&str> {
        let selection = self.selection?;
        self.selected()?
            .images
            .get(selection.image_index)
            .map(String::as_str)
    }

    /// Always starts from the first image, also when reopening the same project.
    pub fn open(&mut self, project_id: ProjectId) -> Result<(), CarouselError> {
        if self.catalog.by_id(project_id).is_none() {
            return Err(CarouselError::UnknownProject(project_id));
        }
        self.selection = Some(CarouselSelection {
            project_id,
            image_index: 0,
        });
        debug!(%project_id, "carousel opened");
        self.emit(CarouselEvent::Opened { project_id });
        Ok(())
    }

    pub fn close(&mut self) {
        if let Some(selection) = self.selection.take() {
            debug!(project_id = %selection.project_id, "carousel closed");
            self.emit(CarouselEvent::Closed {
                project_id: selection.project_id,
            });
        }
    }

    pub fn next(&mut self) {
        self.step(|index, len| (index + 1) % len);
    }

    pub fn prev(&mut self) {
        self.step(|index, len| (index + len - 1) % len);
    }

    pub fn select_image(&mut self, index: usize) -> Result<(), CarouselError> {
        let selection = self.selection.ok_or(CarouselError::NothingSelected)?;
        let len = self.image_count(selection.project_id);
        if index >= len {
            return Err(CarouselError::ImageOutOfRange { index, len });
        }
        self.move_to(selection, index);
        Ok(())
    }

    fn step(&mut self, advance: impl FnOnce(usize, usize) -> usize) {
        let Some(selection) = self.selection else {
            return;
        };
        let len = self.image_count(selection.project_id);
        if len <= 1 {
            return;
        }
        self.move_to(selection, advance(selection.image_index, len));
    }

    fn move_to(&mut self, selection: CarouselSelection, index: usize) {
        if selection.image_index == index {
            return;
        }
        self.selection = Some(CarouselSelection {
            image_index: index,
            ..selection
        });
        self.emit(CarouselEvent::ImageChanged {
            project_id: selection.project_id,
            index,
        });
    }

    fn image_count(&self, project_id: ProjectId) -> usize {
        self.catalog
            .by_id(project_id)
            .map_or(0, Project::image_count)
    }

    fn emit(&self, event: CarouselEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/carousel_tests.rs"]
mod tests;
