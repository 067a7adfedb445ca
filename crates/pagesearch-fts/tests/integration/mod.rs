mod modes;
mod paging;
