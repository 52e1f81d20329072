mod bloom;
mod prime_product;
