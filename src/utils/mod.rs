pub mod const_variable_arr;
