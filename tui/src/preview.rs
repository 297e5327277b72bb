use deck_common::PresentationPreview;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

/// Pager over the outline of a finished deck.
#[derive(Debug, Clone)]
pub struct SlidePreview {
    title: String,
    slides: Vec<String>,
    current_slide: usize,
}

impl SlidePreview {
    pub fn new(preview: PresentationPreview) -> Self {
        let slides = preview
            .slides
            .iter()
            .map(|slide| {
                let mut body = format!("{}. {}\n", slide.slide_number, slide.title);
                if !slide.slide_type.is_empty() {
                    body.push_str(&format!("[{}]\n", slide.slide_type));
                }
                if let Some(notes) = slide.speaker_notes.as_deref().filter(|n| !n.is_empty()) {
                    body.push('\n');
                    body.push_str(notes);
                }
                body
            })
            .collect();
        Self {
            title: preview.title,
            slides,
            current_slide: 0,
        }
    }

    pub fn current(&self) -> usize {
        self.current_slide
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn draw(&self, f: &mut Frame, area: Rect) {
        let default_content = "No slide content".to_string();
        let current_content = self.slides.get(self.current_slide)
            .unwrap_or(&default_content);

        let title = format!(
            " {} ({}/{}) ",
            self.title,
            (self.current_slide + 1).min(self.slides.len()),
            self.slides.len()
        );

        let block = Block::default()
            .title(title)
            .title_bottom(" <-/-> page  Esc close ")
            .borders(Borders::ALL);

        let paragraph = Paragraph::new(current_content.as_str())
            .block(block)
            .wrap(Wrap { trim: true });

        f.render_widget(Clear, area);
        f.render_widget(paragraph, area);
    }

    pub fn next_slide(&mut self) {
        if self.current_slide < self.slides.len().saturating_sub(1) {
            self.current_slide += 1;
        }
    }

    pub fn previous_slide(&mut self) {
        if self.current_slide > 0 {
            self.current_slide -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_common::SlideSummary;

    fn preview(n: u32) -> SlidePreview {
        SlidePreview::new(PresentationPreview {
            title: "Climate".to_string(),
            slides: (1..=n)
                .map(|i| SlideSummary {
                    slide_number: i,
                    title: format!("Slide {i}"),
                    slide_type: "content".to_string(),
                    speaker_notes: None,
                })
                .collect(),
        })
    }

    #[test]
    fn test_paging_is_bounded() {
        let mut pager = preview(2);
        pager.previous_slide();
        assert_eq!(pager.current(), 0);
        pager.next_slide();
        pager.next_slide();
        assert_eq!(pager.current(), 1);
    }

    #[test]
    fn test_empty_preview() {
        let mut pager = preview(0);
        assert!(pager.is_empty());
        pager.next_slide();
        assert_eq!(pager.current(), 0);
    }
}
