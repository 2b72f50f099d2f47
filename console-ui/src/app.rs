use dioxus::prelude::*;

use crate::components::{TaskDetailPage, TaskListPage};

#[derive(Routable, Clone, PartialEq, Debug)]
#[rustfmt::skip]
pub enum Route {
    #[route("/")]
    TaskListPage {},
    #[route("/tasks/:task_id")]
    TaskDetailPage { task_id: i64 },
}

#[component]
pub fn App() -> Element {
    rsx! {
        div {
            style: "min-height: 100vh; background-color: #111827; color: white;",
            Router::<Route> {}
        }
    }
}
