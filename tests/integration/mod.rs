mod cli_surface;
mod corruption;
mod generation_chain;
mod missing_files;
mod nested_roots;
mod reseal;
