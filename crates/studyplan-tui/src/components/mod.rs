pub mod auth_form;
pub mod plan_card;
pub mod plan_form;
pub mod plan_list;
