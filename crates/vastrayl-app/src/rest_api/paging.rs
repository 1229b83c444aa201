use crate::error::{ApiError, ApiResult};
use garde::Validate;
use serde::Serialize;
use vastrayl_dal::{Batch, ListingParams, Order};

#[derive(Debug, Clone, Default, Validate, serde::Deserialize)]
pub struct Paging {
    #[garde(range(min = 1))]
    page: Option<u32>,
    #[garde(range(min = 1, max = 1000))]
    page_size: Option<u32>,
    #[garde(length(max = 255))]
    sort: Option<String>,
}

impl Paging {
    pub fn into_listing_params(self, default_page_size: u32) -> ApiResult<ListingParams> {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self.page_size.unwrap_or(default_page_size);
        let offset = i64::from(page - 1) * i64::from(page_size);
        let order = self
            .sort
            .map(|orderings| {
                orderings
                    .split(',')
                    .map(|name| {
                        let (field_name, descending) = match name.trim() {
                            "" => {
                                return Err(ApiError::InvalidQuery(
                                    "Empty ordering name".to_string(),
                                ))
                            }
                            name if name.len() > 100 => {
                                return Err(ApiError::InvalidQuery(
                                    "Ordering name too long".to_string(),
                                ))
                            }
                            name if name.starts_with('+') => (&name[1..], false),
                            name if name.starts_with('-') => (&name[1..], true),
                            name => (name, false),
                        };

                        let order = if descending {
                            Order::Desc(field_name.to_string())
                        } else {
                            Order::Asc(field_name.to_string())
                        };

                        Ok(order)
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        Ok(ListingParams {
            offset,
            limit: page_size.into(),
            order,
        })
    }

    pub fn page_size(&self, default_page_size: u32) -> u32 {
        self.page_size.unwrap_or(default_page_size)
    }
}

#[derive(Debug, Serialize, serde::Deserialize)]
pub struct Page<T> {
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total: u64,
    pub rows: Vec<T>,
}

impl<T> Page<T>
where
    T: Serialize,
{
    pub fn from_batch(batch: Batch<T>, page_size: u32) -> Self {
        let page_size = page_size.max(1);
        let saturate = |v: u64| u32::try_from(v).unwrap_or(u32::MAX);
        Self {
            page: saturate(batch.offset.max(0) as u64 / u64::from(page_size)).saturating_add(1),
            page_size,
            total_pages: saturate(batch.total.div_ceil(u64::from(page_size))),
            total: batch.total,
            rows: batch.rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_params() {
        let paging = Paging {
            page: Some(3),
            page_size: Some(20),
            sort: Some("-average_rating, id".into()),
        };
        let params = paging.into_listing_params(100).unwrap();
        assert_eq!(params.offset, 40);
        assert_eq!(params.limit, 20);
        let order = params.order.unwrap();
        assert!(matches!(&order[0], Order::Desc(f) if f == "average_rating"));
        assert!(matches!(&order[1], Order::Asc(f) if f == "id"));

        let params = Paging::default().into_listing_params(50).unwrap();
        assert_eq!(params.offset, 0);
        assert_eq!(params.limit, 50);
        assert!(params.order.is_none());

        let paging = Paging {
            sort: Some("id,,title".into()),
            ..Default::default()
        };
        assert!(matches!(
            paging.into_listing_params(10),
            Err(ApiError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_page_from_batch() {
        let batch = Batch {
            offset: 20,
            total: 45,
            rows: vec![1, 2, 3, 4, 5],
        };
        let page = Page::from_batch(batch, 10);
        assert_eq!(page.page, 3);
        assert_eq!(page.total_pages, 5);
        assert_eq!(page.total, 45);
        assert_eq!(page.rows.len(), 5);

        let empty: Page<i32> = Page::from_batch(
            Batch {
                offset: 0,
                total: 0,
                rows: vec![],
            },
            10,
        );
        assert_eq!(empty.page, 1);
        assert_eq!(empty.total_pages, 0);
    }
}
