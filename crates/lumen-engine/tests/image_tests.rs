//! Integration tests for image requests: synchronous loads, deferred
//! completions, stale tickets and failures.

use std::sync::{Arc, Mutex};
use std::thread;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use lumen_common::{ErrorKind, LoadedImage};
use lumen_css::paint::PlaceholderKind;
use lumen_css::{DisplayCommand, DisplayList};
use lumen_engine::{
    ContentChanged, DrawCall, HtmlContainer, ImageCompletion, ImageLoader, ImageRequest, ImageResponse, ImageTicket,
    LayoutRestriction, RecordingGraphics,
};

type Deferred = Arc<Mutex<Vec<(ImageRequest, ImageCompletion)>>>;

/// Answers every request with `Pending` and keeps the completion handle
/// for the test to finish later.
struct DeferredLoader {
    requests: Deferred,
}

impl ImageLoader for DeferredLoader {
    fn load(&mut self, request: &ImageRequest, completion: &ImageCompletion) -> ImageResponse {
        self.requests
            .lock()
            .unwrap()
            .push((request.clone(), completion.clone()));
        ImageResponse::Pending
    }
}

fn deferred_container(html: &str) -> (HtmlContainer, Deferred) {
    let requests = Deferred::default();
    let mut container = HtmlContainer::default().with_image_loader(DeferredLoader {
        requests: Arc::clone(&requests),
    });
    container.set_html(html);
    let _ = container.perform_layout(LayoutRestriction::fixed(300.0)).unwrap();
    (container, requests)
}

fn complete_on_thread(completion: ImageCompletion, ticket: ImageTicket, image: LoadedImage) {
    let handle = thread::spawn(move || completion.complete(ticket, Ok(image)));
    assert!(handle.join().unwrap());
}

fn placeholders(list: &DisplayList) -> Vec<PlaceholderKind> {
    list.commands()
        .iter()
        .filter_map(|c| match c {
            DisplayCommand::DrawPlaceholder { kind, .. } => Some(*kind),
            _ => None,
        })
        .collect()
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 0.01
}

#[test]
fn test_pending_image_completes_from_another_thread() {
    let (mut container, requests) = deferred_container("<img id=i src=a.png alt='a picture'>");
    let list = container.display_list(None);
    assert_eq!(placeholders(&list), [PlaceholderKind::Loading]);
    let before = container.element_rect("i").unwrap();
    assert!(approx(before.width, 20.0));

    let (request, completion) = requests.lock().unwrap().pop().unwrap();
    assert_eq!(request.src, "a.png");
    assert_eq!(request.attrs.get("alt").map(String::as_str), Some("a picture"));
    assert_eq!(request.ticket.generation, container.generation());
    assert!(container.poll_images().is_none());

    complete_on_thread(completion, request.ticket, LoadedImage::solid(30, 10, [255, 0, 0, 255]));
    assert_eq!(
        container.poll_images(),
        Some(ContentChanged {
            layout_required: true
        })
    );
    assert!(container.needs_layout());

    let mut gfx = RecordingGraphics::new();
    container.perform_paint(&mut gfx, None);
    assert!(gfx.calls().iter().any(|call| matches!(call, DrawCall::Image { size: (30, 10), .. })));
    let after = container.element_rect("i").unwrap();
    assert!(approx(after.width, 30.0));
    assert!(approx(after.height, 10.0));
}

#[test]
fn test_sized_image_needs_no_relayout() {
    let (mut container, requests) = deferred_container("<img src=a.png width=40 height=40>");
    let _ = container.display_list(None);
    let (request, completion) = requests.lock().unwrap().pop().unwrap();
    complete_on_thread(completion, request.ticket, LoadedImage::solid(8, 8, [0, 0, 0, 255]));
    assert_eq!(
        container.poll_images(),
        Some(ContentChanged {
            layout_required: false
        })
    );
    assert!(!container.needs_layout());
}

#[test]
fn test_each_source_is_requested_once() {
    let (mut container, requests) = deferred_container("<img src=a.png><img src=a.png><img src=b.png>");
    let _ = container.display_list(None);
    let _ = container.display_list(None);
    let sources: Vec<String> = requests
        .lock()
        .unwrap()
        .iter()
        .map(|(request, _)| request.src.clone())
        .collect();
    assert_eq!(sources, ["a.png", "b.png"]);
}

#[test]
fn test_completion_for_old_document_is_discarded() {
    let (mut container, requests) = deferred_container("<img src=a.png>");
    let _ = container.display_list(None);
    let (request, completion) = requests.lock().unwrap().pop().unwrap();

    container.set_html("<img src=a.png>");
    assert_ne!(request.ticket.generation, container.generation());
    complete_on_thread(completion, request.ticket, LoadedImage::solid(4, 4, [0, 0, 0, 255]));
    assert!(container.poll_images().is_none());
    assert!(container.images().is_empty());
}

#[test]
fn test_failed_completion_shows_error_placeholder() {
    let (mut container, requests) = deferred_container("<img src=a.png>");
    let _ = container.display_list(None);
    let (request, _) = requests.lock().unwrap().pop().unwrap();
    let error = lumen_engine::ImageLoadError::Unsupported("test".to_string());
    assert!(container.image_completion().complete(request.ticket, Err(error)));

    assert_eq!(
        container.poll_images(),
        Some(ContentChanged {
            layout_required: false
        })
    );
    let event = container
        .error_events()
        .try_iter()
        .find(|e| e.kind == ErrorKind::Image)
        .unwrap();
    assert!(event.message.contains("a.png"));
    assert_eq!(placeholders(&container.display_list(None)), [PlaceholderKind::Error]);
}

#[test]
fn test_missing_file_fails_synchronously() {
    let mut container = HtmlContainer::default();
    container.set_base_dir("/nonexistent-lumen-dir");
    container.set_html("<img src=missing.png>");
    let _ = container.perform_layout(LayoutRestriction::fixed(200.0)).unwrap();

    let list = container.display_list(None);
    assert_eq!(placeholders(&list), [PlaceholderKind::Error]);
    assert!(container.error_events().try_iter().any(|e| e.kind == ErrorKind::Image));
    assert!(container.warnings().iter().any(|w| w.component == "Image"));
}

#[test]
fn test_svg_data_url_loads_inline() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="10"><rect width="40" height="10" fill="red"/></svg>"#;
    let html = format!(
        "<p><img id=i src='data:image/svg+xml;base64,{}'></p>",
        STANDARD.encode(svg)
    );
    let mut container = HtmlContainer::default();
    container.set_html(&html);
    let _ = container.perform_layout(LayoutRestriction::fixed(200.0)).unwrap();

    let list = container.display_list(None);
    assert!(placeholders(&list).is_empty());
    assert!(list.commands().iter().any(|c| matches!(c, DisplayCommand::DrawImage { .. })));
    let rect = container.element_rect("i").unwrap();
    assert!(approx(rect.width, 40.0));
    assert!(approx(rect.height, 10.0));
    assert_eq!(container.images().len(), 1);
}
