//! Per-message view state: text overflow, the action menu and the image
//! preview. Each is a small enum with explicit transitions.

/// "See more" state of a text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overflow {
    /// The whole text fits in the collapsed box.
    Fits,
    /// The text is cut to `preview` until the user asks for more.
    Collapsed { preview: String },
    /// The full text is shown. There is no way back to collapsed.
    Expanded,
}

impl Overflow {
    /// Estimate whether `text` overflows a box of `max_lines` rows holding
    /// `chars_per_line` characters each.
    pub fn measure(text: &str, max_lines: usize, chars_per_line: usize) -> Self {
        let chars_per_line = chars_per_line.max(1);
        let mut rows = 0usize;
        let mut preview = String::new();
        for (i, line) in text.split('\n').enumerate() {
            let len = line.chars().count();
            let line_rows = len.div_ceil(chars_per_line).max(1);
            if rows + line_rows > max_lines {
                let remaining = max_lines.saturating_sub(rows);
                if remaining > 0 {
                    if i > 0 {
                        preview.push('\n');
                    }
                    preview.extend(line.chars().take(remaining * chars_per_line));
                }
                return Self::Collapsed { preview };
            }
            if i > 0 {
                preview.push('\n');
            }
            preview.push_str(line);
            rows += line_rows;
        }
        Self::Fits
    }

    /// Reveal the full text. Returns whether the state changed.
    pub fn expand(&mut self) -> bool {
        match self {
            Self::Collapsed { .. } => {
                *self = Self::Expanded;
                true
            }
            Self::Fits | Self::Expanded => false,
        }
    }

    pub fn shows_see_more(&self) -> bool {
        matches!(self, Self::Collapsed { .. })
    }

    /// Text to draw for a message whose full content is `full`.
    pub fn visible<'a>(&'a self, full: &'a str) -> &'a str {
        match self {
            Self::Collapsed { preview } => preview.as_str(),
            Self::Fits | Self::Expanded => full,
        }
    }
}

/// Action menu of a message owned by the session user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuState {
    #[default]
    Closed,
    Open,
    /// Deletion asked for, waiting for the user to confirm or cancel.
    ConfirmPending,
}

impl MenuState {
    pub fn toggle(&mut self) -> bool {
        match self {
            Self::Closed => *self = Self::Open,
            Self::Open => *self = Self::Closed,
            Self::ConfirmPending => return false,
        }
        true
    }

    pub fn request_delete(&mut self) -> bool {
        if *self != Self::Open {
            return false;
        }
        *self = Self::ConfirmPending;
        true
    }

    pub fn cancel(&mut self) -> bool {
        if *self != Self::ConfirmPending {
            return false;
        }
        *self = Self::Closed;
        true
    }

    /// The pointer left the message: an open menu closes, a pending
    /// confirmation stays.
    pub fn pointer_left(&mut self) -> bool {
        if *self != Self::Open {
            return false;
        }
        *self = Self::Closed;
        true
    }

    pub fn is_confirm_pending(&self) -> bool {
        *self == Self::ConfirmPending
    }
}

/// Enlarged preview of an image message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImagePreview {
    #[default]
    Thumbnail,
    Enlarged,
}

impl ImagePreview {
    pub fn toggle(&mut self) {
        *self = match self {
            Self::Thumbnail => Self::Enlarged,
            Self::Enlarged => Self::Thumbnail,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_fits() {
        assert_eq!(Overflow::measure("hello", 4, 40), Overflow::Fits);
        assert_eq!(Overflow::measure("", 4, 40), Overflow::Fits);
        assert_eq!(Overflow::measure("a\nb\nc\nd", 4, 40), Overflow::Fits);
    }

    #[test]
    fn test_too_many_lines_collapse() {
        let overflow = Overflow::measure("a\nb\nc\nd\ne", 4, 40);
        assert_eq!(
            overflow,
            Overflow::Collapsed {
                preview: "a\nb\nc\nd".to_string()
            }
        );
        assert!(overflow.shows_see_more());
    }

    #[test]
    fn test_long_line_wraps() {
        let text = "x".repeat(25);
        match Overflow::measure(&text, 2, 10) {
            Overflow::Collapsed { preview } => assert_eq!(preview, "x".repeat(20)),
            other => panic!("expected collapsed, got {:?}", other),
        }
        assert_eq!(Overflow::measure(&"x".repeat(20), 2, 10), Overflow::Fits);
    }

    #[test]
    fn test_expand_is_one_way() {
        let mut overflow = Overflow::measure("a\nb\nc", 2, 40);
        assert_eq!(overflow.visible("a\nb\nc"), "a\nb");
        assert!(overflow.expand());
        assert_eq!(overflow, Overflow::Expanded);
        assert_eq!(overflow.visible("a\nb\nc"), "a\nb\nc");
        assert!(!overflow.expand());
        assert_eq!(overflow, Overflow::Expanded);

        let mut fits = Overflow::Fits;
        assert!(!fits.expand());
        assert_eq!(fits, Overflow::Fits);
    }

    #[test]
    fn test_menu_transitions() {
        let mut menu = MenuState::default();
        assert!(!menu.request_delete());
        assert!(menu.toggle());
        assert_eq!(menu, MenuState::Open);
        assert!(menu.request_delete());
        assert!(menu.is_confirm_pending());
        assert!(!menu.toggle());
        assert!(!menu.pointer_left());
        assert!(menu.cancel());
        assert_eq!(menu, MenuState::Closed);
        assert!(menu.toggle());
        assert!(menu.pointer_left());
        assert_eq!(menu, MenuState::Closed);
    }

    #[test]
    fn test_image_preview_toggle() {
        let mut preview = ImagePreview::default();
        preview.toggle();
        assert_eq!(preview, ImagePreview::Enlarged);
        preview.toggle();
        assert_eq!(preview, ImagePreview::Thumbnail);
    }
}
