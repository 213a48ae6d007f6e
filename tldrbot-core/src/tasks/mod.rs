pub mod notice_dispatch;
pub mod scrape_loop;

pub use notice_dispatch::spawn_notice_dispatcher;
pub use scrape_loop::spawn_scrape_task;
