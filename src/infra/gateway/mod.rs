pub mod toss_gateway;
