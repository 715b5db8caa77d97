use crate::domain::{Article, ResultPage};

/// Pages of one logical list, in page order, starting at page 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSet {
    pages: Vec<ResultPage>,
    page_size: u32,
}

impl PageSet {
    pub fn first(page: ResultPage, page_size: u32) -> Self {
        let mut pages = Self {
            pages: Vec::with_capacity(1),
            page_size: page_size.max(1),
        };
        pages.push(page);
        pages
    }

    /// Returns a copy with `page` appended as the next page number.
    pub fn with_next(&self, page: ResultPage) -> Self {
        let mut next = self.clone();
        next.push(page);
        next
    }

    fn push(&mut self, mut page: ResultPage) {
        // The first page's total is authoritative: never hold more than it.
        if let Some(total) = self.pages.first().map(|p| p.total_results as usize) {
            let room = total.saturating_sub(self.article_count());
            page.articles.truncate(room);
        }
        self.pages.push(page);
    }

    pub fn pages(&self) -> &[ResultPage] {
        &self.pages
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn article_count(&self) -> usize {
        self.pages.iter().map(|p| p.articles.len()).sum()
    }

    /// Total reported by the first page.
    pub fn total_results(&self) -> u32 {
        self.pages.first().map(|p| p.total_results).unwrap_or(0)
    }

    /// All articles in page order.
    pub fn articles(&self) -> impl Iterator<Item = &Article> {
        self.pages.iter().flat_map(|p| p.articles.iter())
    }

    /// Page number to request next, if more results exist.
    ///
    /// Stops once the loaded count reaches the first page's total or any
    /// later page's (smaller) total, once the page count implied by the
    /// first total is loaded, or after an empty page.
    pub fn next_page(&self) -> Option<u32> {
        let first = self.pages.first()?;
        let last = self.pages.last()?;
        if last.articles.is_empty() {
            return None;
        }

        let loaded = self.article_count();
        let reported = self
            .pages
            .iter()
            .map(|p| p.total_results as usize)
            .min()
            .unwrap_or(0);
        if loaded >= reported {
            return None;
        }

        let total_pages = first.total_results.div_ceil(self.page_size);
        let next = self.page_count() + 1;
        (next <= total_pages).then_some(next)
    }

    pub fn has_more(&self) -> bool {
        self.next_page().is_some()
    }
}
