pub mod board;
pub mod eval_constants;
pub mod move_list;
pub mod sim_board;
