mod listing;
mod pdf_images;

pub use listing::{extract_pdf_links, fetch_document, fetch_listing, http_client};
pub use pdf_images::{extract_page_images, is_image_path, load_image};
