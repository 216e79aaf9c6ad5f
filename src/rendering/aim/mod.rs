pub mod aim_line;
