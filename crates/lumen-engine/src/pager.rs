//! Paged output.
//!
//! The document is laid out once at the page width and cut into pages by
//! scrolling: page `n` is the display list painted with a vertical scroll
//! offset of `n * page_height`, clipped to the page.

use lumen_common::RenderError;
use lumen_css::{DisplayList, Rect};
use serde::Serialize;
use thiserror::Error;

use crate::container::{HtmlContainer, LayoutRestriction};

/// Why pagination failed.
#[derive(Debug, Error)]
pub enum PageError {
    /// Page dimensions must be finite and positive.
    #[error("invalid page size {width} x {height}: dimensions must be finite and positive")]
    InvalidPageSize {
        /// Requested width.
        width: f32,
        /// Requested height.
        height: f32,
    },
    /// Layout rejected the page restriction.
    #[error(transparent)]
    Layout(#[from] RenderError),
}

/// Where a link annotation points.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkTarget {
    /// A URL outside the document.
    External {
        /// The `href` as written.
        href: String,
    },
    /// A position inside the document.
    Anchor {
        /// Zero-based page index.
        page: usize,
        /// Offset from the top of that page.
        y: f32,
    },
}

/// A clickable area of a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkAnnotation {
    /// Area in page coordinates.
    pub rect: Rect,
    /// Destination.
    pub target: LinkTarget,
}

/// One page of output.
#[derive(Debug, Clone)]
pub struct Page {
    /// Zero-based page index.
    pub index: usize,
    /// Drawing commands in page coordinates.
    pub list: DisplayList,
    /// Links that overlap the page.
    pub links: Vec<LinkAnnotation>,
}

/// Cuts a document into fixed-size pages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pager {
    width: f32,
    height: f32,
}

impl Pager {
    /// A pager producing `width` x `height` pages.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::InvalidPageSize`] unless both dimensions are
    /// finite and positive.
    pub fn new(width: f32, height: f32) -> Result<Self, PageError> {
        if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
            Ok(Self { width, height })
        } else {
            Err(PageError::InvalidPageSize { width, height })
        }
    }

    /// Page width and height.
    #[must_use]
    pub const fn page_size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// Pages needed for content of this height; never zero.
    #[must_use]
    pub fn page_count(&self, content_height: f32) -> usize {
        ((content_height / self.height).ceil() as usize).max(1)
    }

    /// Lay `container` out at the page width and return the page count.
    ///
    /// Images the document needs are requested before counting, so
    /// synchronously loaded images already take their space.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Layout`] if layout rejects the page size.
    pub fn layout(&self, container: &mut HtmlContainer) -> Result<usize, PageError> {
        let _ = container.perform_layout(LayoutRestriction {
            max_width: self.width,
            max_height: self.height,
            ..LayoutRestriction::default()
        })?;
        let saved = container.scroll_offset();
        container.set_scroll_offset((0.0, 0.0));
        let _ = container.display_list(None);
        container.set_scroll_offset(saved);
        Ok(self.page_count(container.actual_size().1))
    }

    /// Lay out and paint every page of `container`.
    ///
    /// The container's scroll offset is restored afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Layout`] if layout rejects the page size.
    pub fn paginate(&self, container: &mut HtmlContainer) -> Result<Vec<Page>, PageError> {
        let count = self.layout(container)?;
        let saved = container.scroll_offset();
        let links = container.links();
        let page_rect = Rect::new(0.0, 0.0, self.width, self.height);

        let mut pages = Vec::with_capacity(count);
        for index in 0..count {
            let top = index as f32 * self.height;
            container.set_scroll_offset((0.0, top));
            let list = container.display_list(Some(page_rect));

            let area = page_rect.translate(0.0, top);
            let mut annotations = Vec::new();
            for link in &links {
                let Some(target) = self.target(container, &link.href, count) else {
                    continue;
                };
                annotations.extend(
                    link.rects
                        .iter()
                        .filter_map(|r| r.intersect(&area))
                        .map(|r| LinkAnnotation {
                            rect: r.translate(0.0, -top),
                            target: target.clone(),
                        }),
                );
            }
            log::debug!("page {index}: {} commands, {} links", list.len(), annotations.len());
            pages.push(Page {
                index,
                list,
                links: annotations,
            });
        }
        container.set_scroll_offset(saved);
        Ok(pages)
    }

    /// [§ 7.4.6.4 Scrolling to a fragment](https://html.spec.whatwg.org/multipage/browsing-the-web.html#scroll-to-fragid)
    ///
    /// "If fragment is the empty string, then return the special value top
    /// of the document."
    fn target(&self, container: &HtmlContainer, href: &str, count: usize) -> Option<LinkTarget> {
        let Some(fragment) = href.strip_prefix('#') else {
            return Some(LinkTarget::External {
                href: href.to_string(),
            });
        };
        if fragment.is_empty() {
            return Some(LinkTarget::Anchor { page: 0, y: 0.0 });
        }
        let Some(rect) = container.anchor_rect(fragment) else {
            log::debug!("dropping link to missing anchor '#{fragment}'");
            return None;
        };
        let page = ((rect.y.max(0.0) / self.height).floor() as usize).min(count.saturating_sub(1));
        Some(LinkTarget::Anchor {
            page,
            y: rect.y - page as f32 * self.height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_must_be_finite_and_positive() {
        assert!(Pager::new(100.0, 200.0).is_ok());
        for (w, h) in [(f32::NAN, 100.0), (100.0, f32::INFINITY), (0.0, 100.0), (100.0, -5.0)] {
            assert!(
                matches!(Pager::new(w, h), Err(PageError::InvalidPageSize { .. })),
                "{w} x {h}"
            );
        }
    }

    #[test]
    fn test_page_count() {
        let pager = Pager::new(100.0, 50.0).unwrap();
        assert_eq!(pager.page_count(0.0), 1);
        assert_eq!(pager.page_count(50.0), 1);
        assert_eq!(pager.page_count(50.5), 2);
        assert_eq!(pager.page_count(120.0), 3);
    }

    #[test]
    fn test_link_target_json() {
        let json = serde_json::to_string(&LinkTarget::Anchor { page: 2, y: 10.0 }).unwrap();
        assert_eq!(json, r#"{"kind":"anchor","page":2,"y":10.0}"#);
    }
}
