mod composition;
