pub(crate) mod loading;
pub(crate) mod modal;
pub(crate) mod post_list;
pub(crate) mod text;
