use sea_orm::{DatabaseConnection, DbErr, PaginatorTrait, Select};
use serde::Deserialize;

use crate::entity::post;

/// `?page=` query; anything missing, unparsable or below 1 means page 1.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    pub fn number(&self) -> u64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<u64>().ok())
            .unwrap_or(1)
            .max(1)
    }
}

/// One 1-based slice of an ordered result. Out-of-range pages are empty.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn pages(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total / self.per_page + u64::from(self.total % self.per_page != 0)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.pages()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn next_num(&self) -> Option<u64> {
        self.has_next().then(|| self.page + 1)
    }

    pub fn prev_num(&self) -> Option<u64> {
        self.has_prev().then(|| self.page - 1)
    }
}

pub async fn paginate_posts(
    db: &DatabaseConnection,
    select: Select<post::Entity>,
    page: u64,
    per_page: u64,
) -> Result<Page<post::Model>, DbErr> {
    let page = page.max(1);
    let per_page = per_page.max(1);
    let paginator = select.paginate(db, per_page);
    let total = paginator.num_items().await?;
    let mut result = Page {
        items: Vec::new(),
        page,
        per_page,
        total,
    };
    // Past the last page nothing is fetched, so the offset stays in range.
    if page <= result.pages() {
        result.items = paginator.fetch_page(page - 1).await?;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(page: u64, total: u64) -> Page<()> {
        Page {
            items: Vec::new(),
            page,
            per_page: 3,
            total,
        }
    }

    #[test]
    fn single_page_has_no_links() {
        let p = page(1, 3);
        assert_eq!(p.pages(), 1);
        assert_eq!(p.next_num(), None);
        assert_eq!(p.prev_num(), None);
    }

    #[test]
    fn middle_page_links_both_ways() {
        let p = page(2, 7);
        assert_eq!(p.pages(), 3);
        assert_eq!(p.next_num(), Some(3));
        assert_eq!(p.prev_num(), Some(1));
    }

    #[test]
    fn last_page_only_links_back() {
        let p = page(3, 7);
        assert!(!p.has_next());
        assert_eq!(p.prev_num(), Some(2));
    }

    #[test]
    fn empty_result() {
        let p = page(1, 0);
        assert_eq!(p.pages(), 0);
        assert!(!p.has_next());
        assert!(!p.has_prev());
    }

    #[test]
    fn huge_page_size_does_not_overflow() {
        let p = Page::<()> {
            items: Vec::new(),
            page: 1,
            per_page: u64::MAX,
            total: 2,
        };
        assert_eq!(p.pages(), 1);
    }

    #[actix_web::test]
    async fn page_past_the_end_is_empty() {
        use crate::db::connect_memory;
        use crate::social::{all_posts, create_post};
        use crate::test_support::create_user;

        let db = connect_memory().await;
        let john = create_user(&db, "john", "cat").await;
        for i in 0..4 {
            create_post(&db, john.id, &format!("post {}", i)).await.unwrap();
        }

        let last = paginate_posts(&db, all_posts(), 2, 3).await.unwrap();
        assert_eq!(last.items.len(), 1);

        for number in [3, i64::MAX as u64, u64::MAX] {
            let p = paginate_posts(&db, all_posts(), number, 3).await.unwrap();
            assert!(p.items.is_empty());
            assert_eq!(p.total, 4);
            assert_eq!(p.page, number);
            assert!(!p.has_next());
        }
    }

    #[test]
    fn page_query_defaults_to_first() {
        let q = |s: Option<&str>| PageQuery {
            page: s.map(str::to_string),
        };
        assert_eq!(q(None).number(), 1);
        assert_eq!(q(Some("abc")).number(), 1);
        assert_eq!(q(Some("0")).number(), 1);
        assert_eq!(q(Some("4")).number(), 4);
    }
}
