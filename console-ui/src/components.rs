mod chat_panel;
mod execution_feed;
mod task_detail;
mod task_list;

pub use chat_panel::ChatPanel;
pub use execution_feed::{ExecutionFeed, ProgressBar};
pub use task_detail::TaskDetailPage;
pub use task_list::TaskListPage;
