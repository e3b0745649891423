//! Paged image viewer over one announcement's image list.

/// One viewer frame: the image shown at `index` and where the prev/next
/// controls lead from it. Navigation clamps at both ends, so the first
/// frame's `prev` and the last frame's `next` point back at themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightboxFrame {
    pub index: usize,
    pub url: String,
    pub prev: usize,
    pub next: usize,
}

impl LightboxFrame {
    pub fn has_prev(&self) -> bool {
        self.prev != self.index
    }

    pub fn has_next(&self) -> bool {
        self.next != self.index
    }
}

/// Every frame of the viewer, in image order. Empty for an announcement
/// without images.
pub fn frames(images: &[String]) -> Vec<LightboxFrame> {
    let Some(last) = images.len().checked_sub(1) else {
        return Vec::new();
    };

    images
        .iter()
        .enumerate()
        .map(|(index, url)| LightboxFrame {
            index,
            url: url.clone(),
            prev: index.saturating_sub(1),
            next: (index + 1).min(last),
        })
        .collect()
}
