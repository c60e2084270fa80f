mod product;

pub use product::{
    ListProductsQuery, PageRequest, Pagination, Product, ProductPage, SearchQuery,
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MAX_SEARCH_RESULTS,
};
