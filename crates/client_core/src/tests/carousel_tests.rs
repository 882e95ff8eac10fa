use super::*;
use shared::locale::LocalizedText;

fn project(id: i64, images: usize) -> Project {
    let text = |value: &str| LocalizedText::new(value);
    let images: Vec<String> = (0..images)
        .map(|i| format!("/images/p{id}/{i}.jpg"))
        .collect();
    Project {
        id: ProjectId(id),
        slug: format!("project-{id}"),
        title: text("作品"),
        category: text("分類"),
        materials: text("材料"),
        time_spent: text("時間"),
        description: text("說明"),
        cover_image: images.first().cloned().unwrap_or_default(),
        images,
        color_palette: Vec::new(),
    }
}

fn controller() -> CarouselController {
    let catalog = Catalog::from_projects(vec![project(1, 4), project(2, 1), project(3, 0)])
        .expect("catalog");
    CarouselController::new(Arc::new(catalog))
}

#[test]
fn next_wraps_back_to_first_image_after_full_cycle() {
    let mut carousel = controller();
    carousel.open(ProjectId(1)).expect("open");
    for _ in 0..4 {
        carousel.next();
    }
    assert_eq!(carousel.current_index(), Some(0));
}

#[test]
fn prev_from_first_image_moves_to_last() {
    let mut carousel = controller();
    carousel.open(ProjectId(1)).expect("open");
    carousel.prev();
    assert_eq!(carousel.current_index(), Some(3));
    assert_eq!(carousel.current_image(), Some("/images/p1/3.jpg"));
}

#[test]
fn single_and_empty_galleries_ignore_navigation() {
    let mut carousel = controller();

    carousel.open(ProjectId(2)).expect("open");
    carousel.next();
    carousel.prev();
    assert_eq!(carousel.current_index(), Some(0));

    carousel.open(ProjectId(3)).expect("open");
    carousel.next();
    carousel.prev();
    assert_eq!(carousel.current_index(), Some(0));
    assert_eq!(carousel.current_image(), None);
}

#[test]
fn reopening_resets_to_cover_image() {
    let mut carousel = controller();
    carousel.open(ProjectId(1)).expect("open");
    carousel.select_image(2).expect("select");
    assert_eq!(carousel.current_index(), Some(2));

    carousel.open(ProjectId(1)).expect("reopen");
    assert_eq!(carousel.current_index(), Some(0));
}

#[test]
fn select_image_rejects_out_of_range_index() {
    let mut carousel = controller();
    assert_eq!(
        carousel.select_image(0),
        Err(CarouselError::NothingSelected)
    );

    carousel.open(ProjectId(1)).expect("open");
    carousel.select_image(1).expect("select");
    assert_eq!(
        carousel.select_image(4),
        Err(CarouselError::ImageOutOfRange { index: 4, len: 4 })
    );
    assert_eq!(carousel.current_index(), Some(1));
}

#[test]
fn opening_unknown_project_keeps_current_selection() {
    let mut carousel = controller();
    carousel.open(ProjectId(1)).expect("open");
    assert_eq!(
        carousel.open(ProjectId(42)),
        Err(CarouselError::UnknownProject(ProjectId(42)))
    );
    assert_eq!(
        carousel.selected().map(|project| project.id),
        Some(ProjectId(1))
    );
}

#[test]
fn close_is_idempotent() {
    let mut carousel = controller();
    carousel.close();
    carousel.open(ProjectId(1)).expect("open");
    carousel.close();
    carousel.close();
    assert!(carousel.selection().is_none());
    assert!(carousel.selected().is_none());
    assert_eq!(carousel.current_index(), None);
}

#[test]
fn transitions_are_published_to_subscribers() {
    let mut carousel = controller();
    let mut events = carousel.subscribe();

    carousel.open(ProjectId(1)).expect("open");
    carousel.next();
    carousel.select_image(1).expect("same index");
    carousel.close();
    carousel.close();

    let project_id = ProjectId(1);
    assert_eq!(events.try_recv().expect("opened"), CarouselEvent::Opened { project_id });
    assert_eq!(
        events.try_recv().expect("changed"),
        CarouselEvent::ImageChanged {
            project_id,
            index: 1
        }
    );
    assert_eq!(events.try_recv().expect("closed"), CarouselEvent::Closed { project_id });
    assert!(events.try_recv().is_err());
}
